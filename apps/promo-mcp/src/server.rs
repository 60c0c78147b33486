use std::{net::SocketAddr, sync::Arc};

use axum::{
	Router,
	body::Body,
	extract::State,
	http::{HeaderMap, Request},
	middleware::{self, Next},
	response::IntoResponse,
};
use color_eyre::Result;
use rmcp::{
	ErrorData, ServerHandler,
	handler::server::router::tool::ToolRouter,
	model::{CallToolResult, JsonObject, ServerCapabilities, ServerInfo},
	transport::streamable_http_server::{
		StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
	},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::net::TcpListener;

use crate::{McpAuthState, state::AppState};
use promo_catalog::jsonl;
use promo_domain::PromotionRecord;
use promo_service::{
	ExpandRequest, PromoService, RankRequest, SearchRequest, ServiceError, SlotRequest,
};

const HEADER_AUTHORIZATION: &str = "Authorization";

#[derive(Clone)]
struct PromoMcp {
	service: Arc<PromoService>,
	tool_router: ToolRouter<Self>,
}
impl PromoMcp {
	fn new(service: Arc<PromoService>) -> Self {
		Self { service, tool_router: Self::tool_router() }
	}
}

#[derive(Debug, serde::Deserialize)]
struct ReloadParams {
	#[serde(default)]
	records: Option<Vec<PromotionRecord>>,
}

#[rmcp::tool_router]
impl PromoMcp {
	#[rmcp::tool(
		name = "promo_expand_query",
		description = "Expand a natural-language shopping query into long-tail keyword variants, best first.",
		input_schema = expand_query_schema()
	)]
	async fn promo_expand_query(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let request: ExpandRequest = parse_params(params)?;
		let response = self.service.expand_query(request).await.map_err(to_error_data)?;

		to_result(&response)
	}

	#[rmcp::tool(
		name = "promo_search_promotions",
		description = "Semantic search over the promotion catalog, optionally boosted by a user profile.",
		input_schema = search_promotions_schema()
	)]
	async fn promo_search_promotions(
		&self,
		params: JsonObject,
	) -> Result<CallToolResult, ErrorData> {
		let request: SearchRequest = parse_params(params)?;
		let response = self.service.search_promotions(request).await.map_err(to_error_data)?;

		to_result(&response)
	}

	#[rmcp::tool(
		name = "promo_rank_promotions",
		description = "Rank promotion candidates by predicted engagement for a user profile.",
		input_schema = rank_promotions_schema()
	)]
	async fn promo_rank_promotions(
		&self,
		params: JsonObject,
	) -> Result<CallToolResult, ErrorData> {
		let request: RankRequest = parse_params(params)?;
		let response = self.service.rank_promotions(request).await.map_err(to_error_data)?;

		to_result(&response)
	}

	#[rmcp::tool(
		name = "promo_optimize_ad_slots",
		description = "Insert ranked promotions into an organic result list under the ad density and spacing budget.",
		input_schema = optimize_ad_slots_schema()
	)]
	async fn promo_optimize_ad_slots(
		&self,
		params: JsonObject,
	) -> Result<CallToolResult, ErrorData> {
		let request: SlotRequest = parse_params(params)?;
		let response = self.service.optimize_ad_slots(request).map_err(to_error_data)?;

		to_result(&response)
	}

	#[rmcp::tool(
		name = "promo_reload_catalog",
		description = "Rebuild the promotion catalog from inline records or the configured data file and swap it in atomically.",
		input_schema = reload_catalog_schema()
	)]
	async fn promo_reload_catalog(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		let request: ReloadParams = parse_params(params)?;
		let records = match request.records {
			Some(records) => records,
			None => {
				let raw = crate::state::load_raw_records(
					self.service.cfg.catalog.data_path.as_deref(),
				);

				jsonl::parse_records(&raw).0
			},
		};
		let report = self.service.reload_catalog(records).await.map_err(to_error_data)?;

		to_result(&report)
	}
}

#[rmcp::tool_handler]
impl ServerHandler for PromoMcp {
	fn get_info(&self) -> ServerInfo {
		ServerInfo {
			instructions: Some(
				"PromoSearch MCP server: query expansion, semantic promotion retrieval, \
				 engagement ranking, and ad slot placement."
					.to_string(),
			),
			capabilities: ServerCapabilities::builder().enable_tools().build(),
			..Default::default()
		}
	}
}

pub async fn serve_mcp(bind_addr: &str, state: AppState, auth_state: McpAuthState) -> Result<()> {
	let bind_addr: SocketAddr = bind_addr.parse()?;
	let service = state.service;
	let session_manager: Arc<LocalSessionManager> = Default::default();
	let mcp_service = StreamableHttpService::new(
		move || Ok(PromoMcp::new(service.clone())),
		session_manager,
		StreamableHttpServerConfig::default(),
	);
	let router = Router::new()
		.fallback_service(mcp_service)
		.layer(middleware::from_fn_with_state(auth_state, mcp_auth_middleware));
	let listener = TcpListener::bind(bind_addr).await?;

	tracing::info!(%bind_addr, "MCP server listening.");

	axum::serve(listener, router).await?;

	Ok(())
}

fn parse_params<T: DeserializeOwned>(params: JsonObject) -> Result<T, ErrorData> {
	serde_json::from_value(Value::Object(params))
		.map_err(|err| ErrorData::invalid_params(format!("Invalid parameters: {err}"), None))
}

fn to_result<T: Serialize>(response: &T) -> Result<CallToolResult, ErrorData> {
	let value = serde_json::to_value(response).map_err(|err| {
		ErrorData::internal_error(format!("Failed to encode response: {err}"), None)
	})?;

	Ok(CallToolResult::structured(value))
}

fn to_error_data(err: ServiceError) -> ErrorData {
	match err {
		ServiceError::InvalidRequest { .. } | ServiceError::Validation { .. } =>
			ErrorData::invalid_params(err.to_string(), None),
		ServiceError::Configuration { .. } | ServiceError::Provider { .. } =>
			ErrorData::internal_error(err.to_string(), None),
	}
}

fn is_authorized(headers: &HeaderMap, auth_state: &McpAuthState) -> bool {
	match auth_state {
		McpAuthState::Off => true,
		McpAuthState::StaticKey { bearer_token } =>
			read_bearer_token(headers).is_some_and(|token| token == bearer_token),
	}
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(HEADER_AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

async fn mcp_auth_middleware(
	State(auth_state): State<McpAuthState>,
	req: Request<Body>,
	next: Next,
) -> axum::response::Response {
	if !is_authorized(req.headers(), &auth_state) {
		return (
			axum::http::StatusCode::UNAUTHORIZED,
			"Authentication required for security.auth_mode=static_key with a Bearer token.",
		)
			.into_response();
	}

	next.run(req).await
}

fn user_profile_schema() -> Value {
	serde_json::json!({
		"type": ["object", "null"],
		"additionalProperties": true,
		"properties": {
			"user_type": {
				"type": ["string", "null"],
				"enum": ["casual", "professional", "enterprise", null]
			},
			"interests": { "type": "array", "items": { "type": "string" } },
			"budget_level": {
				"type": ["string", "null"],
				"enum": ["low", "medium", "high", null]
			}
		}
	})
}

fn expand_query_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": true,
		"required": ["query"],
		"properties": {
			"query": { "type": "string" }
		}
	}))
}

fn search_promotions_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": true,
		"required": ["query"],
		"properties": {
			"query": { "type": "string" },
			"user_profile": user_profile_schema()
		}
	}))
}

fn rank_promotions_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": true,
		"required": ["candidates"],
		"properties": {
			"candidates": {
				"type": "array",
				"items": {
					"type": "object",
					"additionalProperties": true,
					"required": ["id"],
					"properties": {
						"id": { "type": "string" },
						"similarity": { "type": ["number", "null"] },
						"categories": { "type": ["array", "null"], "items": { "type": "string" } },
						"price_tier": {
							"type": ["string", "null"],
							"enum": ["low", "medium", "high", null]
						},
						"base_ctr": { "type": ["number", "null"] }
					}
				}
			},
			"user_profile": user_profile_schema()
		}
	}))
}

fn optimize_ad_slots_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": true,
		"required": ["search_results", "promotions"],
		"properties": {
			"search_results": { "type": "array", "items": { "type": "string" } },
			"promotions": {
				"type": "array",
				"items": {
					"type": "object",
					"additionalProperties": true,
					"required": ["id", "title"],
					"properties": {
						"id": { "type": "string" },
						"title": { "type": "string" },
						"description": { "type": ["string", "null"] },
						"link": { "type": ["string", "null"] }
					}
				}
			}
		}
	}))
}

fn reload_catalog_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": true,
		"properties": {
			"records": {
				"type": ["array", "null"],
				"items": {
					"type": "object",
					"additionalProperties": true,
					"required": ["id", "title", "price_tier", "base_ctr"],
					"properties": {
						"id": { "type": "string" },
						"title": { "type": "string" },
						"description": { "type": ["string", "null"] },
						"link": { "type": ["string", "null"] },
						"categories": { "type": ["array", "null"], "items": { "type": "string" } },
						"price_tier": { "type": "string", "enum": ["low", "medium", "high"] },
						"base_ctr": { "type": "number" },
						"embedding": { "type": ["array", "null"], "items": { "type": "number" } }
					}
				}
			}
		}
	}))
}
