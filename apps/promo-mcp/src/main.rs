use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = promo_mcp::Args::parse();

	promo_mcp::run(args).await
}
