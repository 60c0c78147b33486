pub mod server;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use promo_config::{Config, Security};

#[derive(Debug, Parser)]
#[command(
	version = promo_cli::VERSION,
	rename_all = "kebab",
	styles = promo_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum McpAuthState {
	Off,
	StaticKey { bearer_token: String },
}

pub async fn run(args: Args) -> Result<()> {
	let config = promo_config::load(&args.config)?;

	init_tracing(&config);

	let auth_state = build_auth_state(&config.security, &config.service.mcp_bind)?;
	let bind_addr = config.service.mcp_bind.clone();
	let state = state::AppState::new(config).await?;

	server::serve_mcp(&bind_addr, state, auth_state).await
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_auth_state(security: &Security, mcp_bind: &str) -> Result<McpAuthState> {
	match security.auth_mode.trim() {
		"off" => {
			enforce_loopback_for_off_mode(mcp_bind)?;

			Ok(McpAuthState::Off)
		},
		"static_key" => {
			let token = security.auth_token.as_deref().ok_or_else(|| {
				eyre::eyre!("security.auth_token is required when security.auth_mode=static_key.")
			})?;

			Ok(McpAuthState::StaticKey { bearer_token: token.to_string() })
		},
		other => Err(eyre::eyre!(
			"security.auth_mode must be one of off or static_key for promo-mcp, got {other}."
		)),
	}
}

fn enforce_loopback_for_off_mode(mcp_bind: &str) -> Result<()> {
	let bind_addr: SocketAddr = mcp_bind.parse().map_err(|err| {
		eyre::eyre!(
			"service.mcp_bind must be a valid socket address when security.auth_mode=off: {err}"
		)
	})?;

	if !bind_addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"service.mcp_bind must be a loopback address when security.auth_mode=off."
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::{McpAuthState, build_auth_state};
	use promo_config::Security;

	fn sample_security(auth_mode: &str, auth_token: Option<&str>) -> Security {
		Security {
			auth_mode: auth_mode.to_string(),
			auth_token: auth_token.map(|token| token.to_string()),
		}
	}

	#[test]
	fn off_mode_requires_loopback_mcp_bind() {
		let security = sample_security("off", None);
		let err = build_auth_state(&security, "0.0.0.0:8091").expect_err("expected error");

		assert!(err.to_string().contains("loopback"), "unexpected error: {err}");
	}

	#[test]
	fn off_mode_accepts_loopback_mcp_bind() {
		let security = sample_security("off", None);
		let auth_state = build_auth_state(&security, "127.0.0.1:8091").expect("auth state");

		assert_eq!(auth_state, McpAuthState::Off);
	}

	#[test]
	fn static_key_mode_requires_a_token() {
		let security = sample_security("static_key", None);
		let err = build_auth_state(&security, "127.0.0.1:8091").expect_err("expected error");

		assert!(err.to_string().contains("auth_token"), "unexpected error: {err}");
	}

	#[test]
	fn static_key_mode_uses_the_configured_token() {
		let security = sample_security("static_key", Some("token-a"));
		let auth_state = build_auth_state(&security, "0.0.0.0:8091").expect("auth state");

		assert_eq!(auth_state, McpAuthState::StaticKey { bearer_token: "token-a".to_string() });
	}
}
