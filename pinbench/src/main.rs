fn main() -> anyhow::Result<()> {
    pinbench::run()
}
