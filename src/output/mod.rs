pub mod page;
mod styling;

pub use styling::{dim, magenta_bold};

/// Prints the `devdash` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("📊 devdash"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("DIY DevOps Dashboard")
    );
}
