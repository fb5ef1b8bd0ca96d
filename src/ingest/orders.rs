//! Order table loading.

use super::{ColumnIndex, Row};
use crate::error::{AnalyticsError, Result};
use crate::models::OrderFact;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

const TABLE: &str = "orders";

const ORDER_ID: &str = "order_id";
const CUSTOMER_ID: &str = "customer_id";
const APPROVED_AT: &str = "order_approved_at";
const PRICE: &str = "price";
const FREIGHT_VALUE: &str = "freight_value";
const CATEGORY: &str = "product_category_name_english";
const REVIEW_SCORE: &str = "review_score";
const CUSTOMER_STATE: &str = "customer_state";
const ORDER_STATUS: &str = "order_status";

const REQUIRED: &[&str] = &[
    ORDER_ID,
    APPROVED_AT,
    PRICE,
    FREIGHT_VALUE,
    CATEGORY,
    REVIEW_SCORE,
    CUSTOMER_STATE,
    ORDER_STATUS,
];

/// Load the order table from a CSV file.
pub fn load_orders(path: &Path) -> Result<Vec<OrderFact>> {
    info!("Loading orders from: {}", path.display());
    let file = File::open(path)?;
    read_orders(BufReader::with_capacity(1 << 20, file))
}

/// Read order rows from any CSV source.
///
/// Rows come back sorted by approval time with undated rows last; the
/// relative order of rows with equal timestamps is preserved.
pub fn read_orders<R: Read>(reader: R) -> Result<Vec<OrderFact>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let index = ColumnIndex::from_headers(TABLE, rdr.headers()?);
    index.require(REQUIRED)?;

    let pos = |column: &str| {
        index.position(column).ok_or_else(|| AnalyticsError::SchemaMismatch {
            table: TABLE,
            missing: vec![column.to_string()],
        })
    };
    let order_id = pos(ORDER_ID)?;
    let approved_at = pos(APPROVED_AT)?;
    let price = pos(PRICE)?;
    let freight_value = pos(FREIGHT_VALUE)?;
    let category = pos(CATEGORY)?;
    let review_score = pos(REVIEW_SCORE)?;
    let customer_state = pos(CUSTOMER_STATE)?;
    let order_status = pos(ORDER_STATUS)?;
    let customer_id = index.position(CUSTOMER_ID);

    let mut orders = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row = Row::new(TABLE, &record);

        orders.push(OrderFact {
            order_id: row.required_text(order_id, ORDER_ID)?,
            customer_id: row.optional_text(customer_id),
            order_approved_at: row.timestamp(approved_at, APPROVED_AT)?,
            price: row.non_negative(price, PRICE)?,
            freight_value: row.non_negative(freight_value, FREIGHT_VALUE)?,
            product_category_name_english: row.optional_text(Some(category)),
            review_score: row.review_score(review_score, REVIEW_SCORE)?,
            customer_state: row.required_text(customer_state, CUSTOMER_STATE)?,
            order_status: row.required_text(order_status, ORDER_STATUS)?,
        });
    }

    orders.sort_by_key(|o| (o.order_approved_at.is_none(), o.order_approved_at));

    let undated = orders
        .iter()
        .filter(|o| o.order_approved_at.is_none())
        .count();
    debug!("Read {} order rows ({} without approval time)", orders.len(), undated);

    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "order_id,customer_id,order_status,order_approved_at,price,freight_value,product_category_name_english,review_score,customer_state";

    fn csv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_read_orders_parses_and_sorts() {
        let data = csv(&[
            "o2,c2,delivered,2018-01-02 09:00:00,5.0,1.5,toys,4.0,RJ",
            "o1,c1,delivered,2018-01-01 10:00:00,10,2,bed_bath_table,5,SP",
            "o3,c3,canceled,,7.5,0,,,MG",
        ]);

        let orders = read_orders(data.as_bytes()).unwrap();
        assert_eq!(orders.len(), 3);
        assert_eq!(orders[0].order_id, "o1");
        assert_eq!(orders[1].order_id, "o2");
        assert_eq!(orders[2].order_id, "o3");

        assert_eq!(orders[1].review_score, Some(4));
        assert_eq!(orders[1].freight_value, 1.5);
        assert_eq!(orders[2].order_approved_at, None);
        assert_eq!(orders[2].product_category_name_english, None);
        assert_eq!(orders[2].review_score, None);
        assert_eq!(orders[0].customer_id.as_deref(), Some("c1"));
    }

    #[test]
    fn test_missing_column_is_schema_mismatch() {
        let data = "order_id,order_approved_at,price\no1,2018-01-01,10\n";
        let err = read_orders(data.as_bytes()).unwrap_err();
        match err {
            AnalyticsError::SchemaMismatch { table, missing } => {
                assert_eq!(table, "orders");
                assert!(missing.contains(&"freight_value".to_string()));
                assert!(missing.contains(&"order_status".to_string()));
                assert!(!missing.contains(&"price".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_customer_id_is_optional() {
        let data = "order_id,order_status,order_approved_at,price,freight_value,product_category_name_english,review_score,customer_state\n\
                    o1,delivered,2018-01-01 10:00:00,10,2,toys,5,SP\n";
        let orders = read_orders(data.as_bytes()).unwrap();
        assert_eq!(orders[0].customer_id, None);
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let data = csv(&["o1,c1,delivered,2018-01-01 10:00:00,-3,0,toys,5,SP"]);
        let err = read_orders(data.as_bytes()).unwrap_err();
        match err {
            AnalyticsError::InvalidField { column, line, .. } => {
                assert_eq!(column, "price");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_amounts_read_as_zero() {
        let data = csv(&["o1,c1,delivered,2018-01-01 10:00:00,,,toys,5,SP"]);
        let orders = read_orders(data.as_bytes()).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].price, 0.0);
        assert_eq!(orders[0].spend(), 0.0);
    }

    #[test]
    fn test_review_score_out_of_range_is_rejected() {
        let data = csv(&["o1,c1,delivered,2018-01-01 10:00:00,3,0,toys,6,SP"]);
        let err = read_orders(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::InvalidField {
                column: "review_score",
                ..
            }
        ));
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let data = csv(&["o1,c1,delivered,yesterday,3,0,toys,5,SP"]);
        assert!(read_orders(data.as_bytes()).is_err());
    }

    #[test]
    fn test_load_orders_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            csv(&["o1,c1,delivered,2018-01-01 10:00:00,10,2,toys,5,SP"])
        )
        .unwrap();

        let orders = load_orders(file.path()).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].price, 10.0);
    }

    #[test]
    fn test_load_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/orders.csv");
        let orders = load_orders(&path).unwrap();
        assert_eq!(orders.len(), 12);
        assert!(orders.last().unwrap().order_approved_at.is_none());
    }
}
