//! igitt binary entry point.

fn main() -> anyhow::Result<()> {
    igitt::cli::run()
}
