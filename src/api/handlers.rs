use async_graphql::{
    http::{GraphiQLSource, ALL_WEBSOCKET_PROTOCOLS},
    parser::{parse_query, types::OperationType},
    Data,
};
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::{
    extract::{State, WebSocketUpgrade},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::debug;

use crate::api::AppState;
use crate::auth::AuthContextResolver;

/// Handler for GraphQL queries and mutations
pub async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let context = state.auth.resolve(authorization(&headers)).await;
    let request = req.into_inner().data(context);
    state.schema.execute(request).await.into()
}

/// GET on the GraphQL path: a WebSocket upgrade starts a subscription
/// session, a `?query=` runs that query, anything else gets GraphiQL.
pub async fn graphql_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    protocol: Option<GraphQLProtocol>,
    upgrade: Option<WebSocketUpgrade>,
    request: Option<GraphQLRequest>,
) -> Response {
    match (upgrade, protocol, request) {
        (Some(upgrade), Some(protocol), _) => {
            let header_auth = authorization(&headers).map(str::to_string);
            graphql_subscription(state, upgrade, protocol, header_auth)
        }
        (_, _, Some(request)) => graphql_query_get(&state, &headers, request.into_inner()).await,
        _ => graphiql().await.into_response(),
    }
}

async fn graphql_query_get(
    state: &AppState,
    headers: &HeaderMap,
    request: async_graphql::Request,
) -> Response {
    // Mutations over GET would be open to cross-site requests.
    if selects_mutation(&request) {
        return (StatusCode::METHOD_NOT_ALLOWED, "mutations must be sent with POST").into_response();
    }
    let context = state.auth.resolve(authorization(headers)).await;
    GraphQLResponse::from(state.schema.execute(request.data(context)).await).into_response()
}

fn graphql_subscription(
    state: AppState,
    upgrade: WebSocketUpgrade,
    protocol: GraphQLProtocol,
    header_auth: Option<String>,
) -> Response {
    upgrade
        .protocols(ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |stream| {
            let auth = state.auth.clone();
            GraphQLWebSocket::new(stream, state.schema.clone(), protocol)
                .on_connection_init(move |payload| connection_data(auth, payload, header_auth))
                .serve()
        })
}

/// Session data for a subscription connection: the identity named by the
/// `connection_init` payload, falling back to the upgrade request's header.
async fn connection_data(
    auth: AuthContextResolver,
    payload: serde_json::Value,
    header_auth: Option<String>,
) -> async_graphql::Result<Data> {
    debug!("GraphQL subscription connection initialized");
    let token = init_authorization(&payload).or(header_auth);
    let context = auth.resolve(token.as_deref()).await;
    let mut data = Data::default();
    data.insert(context);
    Ok(data)
}

pub async fn graphiql() -> impl IntoResponse {
    Html(
        GraphiQLSource::build()
            .endpoint("/")
            .subscription_endpoint("/")
            .finish(),
    )
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// Clients put the header value in the `connection_init` payload, under
/// either capitalisation.
fn init_authorization(payload: &serde_json::Value) -> Option<String> {
    ["authorization", "Authorization"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(|v| v.as_str()))
        .map(str::to_string)
}

/// Whether the operation `request` would run is a mutation. Unparsable
/// documents are left for execution to report.
fn selects_mutation(request: &async_graphql::Request) -> bool {
    let Ok(document) = parse_query(&request.query) else {
        return false;
    };
    document.operations.iter().any(|(name, operation)| {
        operation.node.ty == OperationType::Mutation
            && request
                .operation_name
                .as_deref()
                .map_or(true, |wanted| name.map(|n| n.as_str()) == Some(wanted))
    })
}
