// File: services/bookwise_backend/src/main.rs
use axum::{routing::get, Router};
use bookwise_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

mod app_state;
mod service_factory;

use app_state::AppState;

#[tokio::main]
async fn main() {
    bookwise_common::init();

    let config = Arc::new(load_config().expect("Failed to load config"));
    let state = AppState::new(config.clone()).await;

    let root_router = Router::new().route("/", get(|| async { "Welcome to the Bookwise API!" }));

    #[cfg(feature = "gcal")]
    let booking_router = {
        use bookwise_common::services::{Boxed, BoxedError, CalendarService, ServiceFactory};
        use bookwise_gcal::handlers::BookingState;
        use bookwise_gcal::service::UnavailableCalendarService;

        // Without a working calendar the booking surface stays mounted and
        // degrades: availability answers with an empty list and a warning.
        let calendar = state
            .service_factory
            .calendar_service()
            .unwrap_or_else(|| {
                tracing::warn!("Calendar service unavailable, booking surface degrades.");
                let fallback: Arc<dyn CalendarService<Error = BoxedError>> =
                    Arc::new(Boxed::new(UnavailableCalendarService));
                fallback
            });
        let mailer = state.service_factory.notification_service();
        let booking_state = Arc::new(BookingState::new(config.clone(), calendar, mailer));
        bookwise_gcal::routes::routes(booking_state)
    };

    let api_router = Router::new().nest("/api", {
        #[allow(unused_mut)] // mutated only with certain features
        let mut router = root_router;
        #[cfg(feature = "gcal")]
        {
            router = router.merge(booking_router);
        }
        router
    });

    #[allow(unused_mut)]
    let mut app = api_router;

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use bookwise_gcal::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Bookwise API",
                version = "0.1.0",
                description = "Bookwise booking service API docs",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            components(),
            tags( (name = "Bookwise", description = "Core service endpoints")),
            servers( (url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        println!("📖 Adding Swagger UI at /api/docs");

        let swagger_ui =
            SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc.clone());
        app = app.merge(swagger_ui);
    }

    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await.unwrap();
    println!("Starting server at http://{}", addr);
    println!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}
