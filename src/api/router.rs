use axum::routing::any;
use axum::Router;
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::api::handlers::handle_bid_request;
use crate::AppState;

/// 构造路由；`/bid` 接受所有方法，由校验器返回 405
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/bid", any(handle_bid_request))
        .with_state(state)
}

/// 在给定 listener 上运行服务，`shutdown` 完成后优雅退出
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
