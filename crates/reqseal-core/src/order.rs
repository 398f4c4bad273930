//! Correlation ids ("customer order numbers") for outgoing requests

use chrono::{Local, NaiveDateTime};
use rand::Rng;

/// Length of a generated order number: 14 timestamp digits + 6 random digits
pub const ORDER_NO_LEN: usize = 20;

/// Generate an order number from the current local time.
pub fn generate_order_no() -> String {
    order_no_at(Local::now().naive_local(), &mut rand::thread_rng())
}

/// `%Y%m%d%H%M%S` followed by six random decimal digits.
pub fn order_no_at<R: Rng>(at: NaiveDateTime, rng: &mut R) -> String {
    let suffix: u32 = rng.gen_range(0..1_000_000);
    format!("{}{suffix:06}", at.format("%Y%m%d%H%M%S"))
}
