use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tracing::info;

use crate::AppState;
use fairline::core::{margin, normalize};
use fairline::error::OddsError;
use fairline::evaluation::evaluate;
use fairline::models::{DevigRequest, DevigResponse, EvaluateRequest};

fn check_rows(state: &AppState, rows: usize) -> Result<(), OddsError> {
    if rows > state.max_rows {
        return Err(OddsError::Shape(format!(
            "{} rows exceeds the limit of {}",
            rows, state.max_rows
        )));
    }
    Ok(())
}

/// Remove the margin from a batch of two-way quotes
pub async fn devig(
    state: web::Data<Arc<AppState>>,
    req: web::Json<DevigRequest>,
) -> Result<HttpResponse, OddsError> {
    check_rows(&state, req.odds.len())?;

    let fair = normalize(req.policy, &req.odds)?;
    let margins = req.odds.iter().map(margin).collect();

    Ok(HttpResponse::Ok().json(DevigResponse {
        policy: req.policy,
        margins,
        fair,
    }))
}

/// De-vig, backtest the favorite and score calibration in one call
pub async fn evaluate_matches(
    state: web::Data<Arc<AppState>>,
    req: web::Json<EvaluateRequest>,
) -> Result<HttpResponse, OddsError> {
    check_rows(&state, req.odds.len())?;

    let evaluation = evaluate(&req.odds, &req.outcomes, &req.options)?;
    info!(
        "Evaluated {} matches: brier {:.4}, roi {:.1}%",
        evaluation.matches,
        evaluation.brier_score,
        evaluation.backtest.roi() * 100.0
    );

    Ok(HttpResponse::Ok().json(evaluation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::health;
    use actix_web::{http::StatusCode, test, App};
    use fairline::models::{ErrorResponse, HealthResponse};
    use fairline::Evaluation;
    use serde_json::json;

    fn app_state(max_rows: usize) -> web::Data<Arc<AppState>> {
        web::Data::new(Arc::new(AppState { max_rows }))
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(
            App::new().route("/health", web::get().to(health::health_check)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.status, "ok");
    }

    #[actix_web::test]
    async fn test_devig_even_market() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(100))
                .route("/devig", web::post().to(devig)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/devig")
            .set_json(json!({"odds": [{"home_odds": 1.9, "away_odds": 1.9}]}))
            .to_request();
        let body: DevigResponse = test::call_and_read_body_json(&app, req).await;

        assert!((body.fair.probs[0].home_prob - 0.5).abs() < 1e-12);
        assert!((body.fair.odds[0].away_odds - 2.0).abs() < 1e-12);
        assert!(body.margins[0] > 0.05);
    }

    #[actix_web::test]
    async fn test_devig_invalid_odds_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(100))
                .route("/devig", web::post().to(devig)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/devig")
            .set_json(json!({"odds": [{"home_odds": 1.0, "away_odds": 2.0}]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "invalid_odds");
    }

    #[actix_web::test]
    async fn test_devig_row_limit() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(1))
                .route("/devig", web::post().to(devig)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/devig")
            .set_json(json!({"odds": [
                {"home_odds": 1.5, "away_odds": 2.6},
                {"home_odds": 2.1, "away_odds": 1.8}
            ]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "shape_error");
    }

    #[actix_web::test]
    async fn test_evaluate_favorites() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(100))
                .route("/evaluate", web::post().to(evaluate_matches)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/evaluate")
            .set_json(json!({
                "odds": [
                    {"home_odds": 1.5, "away_odds": 2.6},
                    {"home_odds": 2.1, "away_odds": 1.8}
                ],
                "outcomes": [1, 1],
                "stake": 10.0
            }))
            .to_request();
        let body: Evaluation = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.matches, 2);
        let profits = body.backtest.profits();
        assert!((profits[0] - 5.0).abs() < 1e-9);
        assert!((profits[1] + 10.0).abs() < 1e-9);
        assert_eq!(body.backtest.total_wins(), 1);
    }

    #[actix_web::test]
    async fn test_evaluate_invalid_stake() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(100))
                .route("/evaluate", web::post().to(evaluate_matches)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/evaluate")
            .set_json(json!({
                "odds": [{"home_odds": 1.5, "away_odds": 2.6}],
                "outcomes": [1],
                "stake": -5.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "invalid_stake");
    }

    #[actix_web::test]
    async fn test_evaluate_oversized_bins() {
        let app = test::init_service(
            App::new()
                .app_data(app_state(100))
                .route("/evaluate", web::post().to(evaluate_matches)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/evaluate")
            .set_json(json!({
                "odds": [{"home_odds": 1.5, "away_odds": 2.6}],
                "outcomes": [1],
                "bins": 1_000_000_000u64
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "invalid_bins");
    }
}
