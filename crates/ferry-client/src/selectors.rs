//! Markup of the schedule page. Both record sources select with these.

/// One sailing row.
pub const RECORD: &str = ".time.list-record";

/// Sub-elements explicitly carrying a clock time.
pub const TIME_VALUE: &str = ".departure-time, .arrival-time, .time-value";

/// Primary "select/book" button of a row.
pub const ACTION_CONTROL: &str = "button.btn-red";

/// Desktop Chrome, sent with every schedule request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
