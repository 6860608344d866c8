/// Intercept messages using the `log` crate and print them to STDERR. `RUST_LOG` overrides the
/// default `info` filter.
pub fn setup() {
    use env_logger::{Builder, Env};
    // Tests and repeated callers may have already installed a logger
    let _ = Builder::from_env(Env::default().default_filter_or("info")).try_init();
}
