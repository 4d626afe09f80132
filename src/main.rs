fn main() -> anyhow::Result<()> {
    scribbly::cli::run()
}
