//! REST routes over the scorer and the loan ledger

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, State},
    http::{request::Parts, Method, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use sharc_common::{
    Address, BasisPoints, CreditDecision, CreditScore, LedgerError, Loan, LoanId, MinorUnits,
    Result as SharcResult, VERSION,
};
use sharc_ledger::{
    EventPage, EventRecord, EventSink, JournalQuery, LedgerConfig, LedgerStats, LoanFilter,
    LoanLedger, RepaymentReceipt, MAX_PAGE_SIZE,
};
use sharc_scorer::{
    FreelanceHistoryPayload, HistorySummary, InMemoryScoreStore, ScoreHistoryEntry, ScoreRecord,
    ScoreReport, ScoreSource, ScoringService,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::debug;

use crate::error::ApiError;

/// Header carrying the caller's address
pub const CALLER_HEADER: &str = "x-sharc-caller";

type ApiResult<T> = Result<T, ApiError>;

// ============ STATE ============

#[derive(Clone)]
pub struct AppState {
    scoring: Arc<ScoringService>,
    ledger: Arc<LoanLedger>,
}

impl AppState {
    /// Scorer and ledger sharing one in-memory score store
    pub fn new(config: LedgerConfig) -> SharcResult<Self> {
        let store = Arc::new(InMemoryScoreStore::new());
        let scoring = ScoringService::new(store.clone());
        let ledger = LoanLedger::new(config, store)?.with_sink(Arc::new(JournalLog));

        Ok(Self {
            scoring: Arc::new(scoring),
            ledger: Arc::new(ledger),
        })
    }

    fn ensure_owner(&self, caller: &Address) -> ApiResult<()> {
        if caller != self.ledger.owner() {
            return Err(LedgerError::Unauthorized {
                caller: caller.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// Mirrors journal appends into the service log
struct JournalLog;

impl EventSink for JournalLog {
    fn on_event(&self, record: &EventRecord) {
        debug!(
            sequence = record.sequence,
            event_id = %record.event_id,
            kind = ?record.event.kind(),
            "Ledger event"
        );
    }
}

// ============ CALLER ============

/// Authenticated caller taken from [`CALLER_HEADER`]
pub struct Caller(pub Address);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::MissingCaller)?;
        Ok(Caller(Address::parse(raw)?))
    }
}

// ============ EXTRACTORS ============

/// JSON body whose rejection renders as an [`ApiError`]
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(ApiError))]
struct ApiPath<T>(T);

#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
struct ApiQuery<T>(T);

// ============ REQUEST / RESPONSE TYPES ============

#[derive(Debug, Deserialize)]
struct AmountRequest {
    amount: MinorUnits,
}

#[derive(Debug, Deserialize)]
struct IssueLoanRequest {
    borrower: Address,
    principal: MinorUnits,
}

#[derive(Debug, Deserialize)]
struct SetScoreRequest {
    score: CreditScore,
}

#[derive(Debug, Deserialize)]
struct ServiceFeeRateRequest {
    service_fee_rate_bps: BasisPoints,
}

#[derive(Debug, Deserialize)]
struct MinCreditScoreRequest {
    min_credit_score: CreditScore,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    ledger: LedgerStats,
    cached_decisions: usize,
}

#[derive(Debug, Serialize)]
struct PoolBalance {
    liquidity_minor_units: MinorUnits,
}

#[derive(Debug, Serialize)]
struct RemainingBalance {
    loan_id: LoanId,
    remaining_minor_units: MinorUnits,
}

#[derive(Debug, Serialize)]
struct BorrowerLoans {
    borrower: Address,
    loan_ids: Vec<LoanId>,
}

#[derive(Debug, Serialize)]
struct Settings {
    service_fee_rate_bps: BasisPoints,
    min_credit_score: CreditScore,
}

// ============ HANDLERS ============

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: VERSION,
        ledger: state.ledger.stats(),
        cached_decisions: state.scoring.decision_count(),
    })
}

async fn freelancer_summary(
    ApiJson(payload): ApiJson<FreelanceHistoryPayload>,
) -> Json<HistorySummary> {
    Json(payload.summary())
}

async fn preview_score(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<FreelanceHistoryPayload>,
) -> ApiResult<Json<CreditDecision>> {
    let history = payload.to_history()?;
    Ok(Json(state.scoring.preview(&history)?))
}

async fn score_breakdown(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<FreelanceHistoryPayload>,
) -> ApiResult<Json<ScoreReport>> {
    let history = payload.to_history()?;
    Ok(Json(state.scoring.report(&history)?))
}

async fn evaluate_score(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiJson(payload): ApiJson<FreelanceHistoryPayload>,
) -> ApiResult<Json<CreditDecision>> {
    let subject = payload.subject()?;
    if subject != caller {
        return Err(ApiError::SubjectMismatch {
            caller: caller.short(),
            subject: subject.short(),
        });
    }

    let history = payload.to_history()?;
    Ok(Json(state.scoring.evaluate(&caller, &history)?))
}

async fn last_decision(
    State(state): State<AppState>,
    ApiPath(subject): ApiPath<Address>,
) -> Json<CreditDecision> {
    Json(state.scoring.get_last_decision(&subject))
}

async fn get_score(State(state): State<AppState>, ApiPath(subject): ApiPath<Address>) -> Json<ScoreRecord> {
    Json(state.scoring.store().get_score(&subject))
}

async fn set_score(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiPath(subject): ApiPath<Address>,
    ApiJson(req): ApiJson<SetScoreRequest>,
) -> ApiResult<Json<ScoreRecord>> {
    state.ensure_owner(&caller)?;
    let record = state
        .scoring
        .store()
        .set_score(&subject, req.score, ScoreSource::Manual)?;
    Ok(Json(record))
}

async fn score_history(
    State(state): State<AppState>,
    ApiPath(subject): ApiPath<Address>,
) -> Json<Vec<ScoreHistoryEntry>> {
    Json(state.scoring.store().score_history(&subject))
}

async fn publish_score(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiPath(subject): ApiPath<Address>,
) -> ApiResult<Json<ScoreRecord>> {
    state.ensure_owner(&caller)?;
    Ok(Json(state.scoring.publish_decision(&subject)?))
}

async fn fund_pool(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiJson(req): ApiJson<AmountRequest>,
) -> ApiResult<Json<PoolBalance>> {
    let liquidity = state.ledger.fund(&caller, req.amount)?;
    Ok(Json(PoolBalance {
        liquidity_minor_units: liquidity,
    }))
}

async fn withdraw_pool(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiJson(req): ApiJson<AmountRequest>,
) -> ApiResult<Json<PoolBalance>> {
    let liquidity = state.ledger.withdraw(&caller, req.amount)?;
    Ok(Json(PoolBalance {
        liquidity_minor_units: liquidity,
    }))
}

async fn pool_balance(State(state): State<AppState>) -> Json<PoolBalance> {
    Json(PoolBalance {
        liquidity_minor_units: state.ledger.get_balance(),
    })
}

async fn list_loans(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<LoanFilter>,
) -> Json<Vec<Loan>> {
    Json(state.ledger.loans(&filter))
}

async fn issue_loan(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiJson(req): ApiJson<IssueLoanRequest>,
) -> ApiResult<impl IntoResponse> {
    let loan = state.ledger.issue_loan(&caller, &req.borrower, req.principal)?;
    Ok((StatusCode::CREATED, Json(loan)))
}

async fn get_loan(State(state): State<AppState>, ApiPath(loan_id): ApiPath<LoanId>) -> ApiResult<Json<Loan>> {
    state
        .ledger
        .loan(loan_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Loan {}", loan_id)))
}

async fn remaining_balance(
    State(state): State<AppState>,
    ApiPath(loan_id): ApiPath<LoanId>,
) -> Json<RemainingBalance> {
    Json(RemainingBalance {
        loan_id,
        remaining_minor_units: state.ledger.get_remaining_balance(loan_id),
    })
}

async fn repay_loan(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiPath(loan_id): ApiPath<LoanId>,
    ApiJson(req): ApiJson<AmountRequest>,
) -> ApiResult<Json<RepaymentReceipt>> {
    Ok(Json(state.ledger.repay(&caller, loan_id, req.amount)?))
}

async fn cancel_loan(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiPath(loan_id): ApiPath<LoanId>,
) -> ApiResult<Json<Loan>> {
    Ok(Json(state.ledger.cancel_loan(&caller, loan_id)?))
}

async fn borrower_loans(
    State(state): State<AppState>,
    ApiPath(borrower): ApiPath<Address>,
) -> Json<BorrowerLoans> {
    let loan_ids = state.ledger.get_borrower_loans(&borrower);
    Json(BorrowerLoans { borrower, loan_ids })
}

fn settings(ledger: &LoanLedger) -> Json<Settings> {
    Json(Settings {
        service_fee_rate_bps: ledger.service_fee_rate(),
        min_credit_score: ledger.min_credit_score(),
    })
}

async fn update_service_fee_rate(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiJson(req): ApiJson<ServiceFeeRateRequest>,
) -> ApiResult<Json<Settings>> {
    state
        .ledger
        .update_service_fee_rate(&caller, req.service_fee_rate_bps)?;
    Ok(settings(&state.ledger))
}

async fn update_min_credit_score(
    State(state): State<AppState>,
    Caller(caller): Caller,
    ApiJson(req): ApiJson<MinCreditScoreRequest>,
) -> ApiResult<Json<Settings>> {
    state
        .ledger
        .update_min_credit_score(&caller, req.min_credit_score)?;
    Ok(settings(&state.ledger))
}

async fn list_events(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<JournalQuery>,
) -> ApiResult<Json<EventPage>> {
    if query.page == Some(0) {
        return Err(ApiError::InvalidQuery("page starts at 1".to_string()));
    }
    if let Some(size) = query.page_size {
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(ApiError::InvalidQuery(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
    }
    Ok(Json(state.ledger.events(&query)))
}

// ============ ROUTER ============

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check))
        // Scoring
        .route("/api/freelancers/summary", post(freelancer_summary))
        .route("/api/scores/preview", post(preview_score))
        .route("/api/scores/evaluate", post(evaluate_score))
        .route("/api/scores/breakdown", post(score_breakdown))
        .route("/api/scores/:address", get(get_score).put(set_score))
        .route("/api/scores/:address/decision", get(last_decision))
        .route("/api/scores/:address/history", get(score_history))
        .route("/api/scores/:address/publish", post(publish_score))
        // Pool
        .route("/api/pool/fund", post(fund_pool))
        .route("/api/pool/withdraw", post(withdraw_pool))
        .route("/api/pool/balance", get(pool_balance))
        // Loans
        .route("/api/loans", get(list_loans).post(issue_loan))
        .route("/api/loans/:id", get(get_loan))
        .route("/api/loans/:id/remaining", get(remaining_balance))
        .route("/api/loans/:id/repay", post(repay_loan))
        .route("/api/loans/:id/cancel", post(cancel_loan))
        .route("/api/borrowers/:address/loans", get(borrower_loans))
        // Settings
        .route("/api/settings/service-fee-rate", put(update_service_fee_rate))
        .route("/api/settings/min-credit-score", put(update_min_credit_score))
        // Journal
        .route("/api/events", get(list_events))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const OWNER: &str = "0x00000000000000000000000000000000000000aa";
    const FREELANCER: &str = "0xa1b2c3d4e5f60718293a4b5c6d7e8f9012345678";
    const STRANGER: &str = "0x00000000000000000000000000000000000000ee";

    const PAYLOAD: &str = r#"{
        "freelancerAddress": "0xA1B2C3D4E5F60718293A4B5C6D7E8F9012345678",
        "snapshotTimestampEpoch": 1761955200,
        "lookbackMonths": 12,
        "platforms": [
            {"platform": "upwork", "summary": {"totalEarnedUsdc": 12500000000, "csvSampleCount": 26, "lastPayoutEpoch": 1761951600, "onTimeRatioBps": 9700}},
            {"platform": "fiverr", "summary": {"totalEarnedUsdc": 6200000000, "csvSampleCount": 24, "lastPayoutEpoch": 1761948000, "onTimeRatioBps": 9300}},
            {"platform": "deliveroo", "summary": {"totalEarnedUsdc": 9800000000, "csvSampleCount": 28, "lastPayoutEpoch": 1761955200, "onTimeRatioBps": 9900}}
        ]
    }"#;

    fn app() -> Router {
        let owner = Address::parse(OWNER).unwrap();
        router(AppState::new(LedgerConfig::new(owner)).unwrap())
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        caller: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(caller) = caller {
            builder = builder.header(CALLER_HEADER, caller);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    fn amount(n: u64) -> Option<String> {
        Some(serde_json::json!({ "amount": n }).to_string())
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = call(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["ledger"]["total_loans"], 0);
    }

    #[tokio::test]
    async fn test_pool_requires_owner() {
        let app = app();

        let (status, _) = call(&app, "POST", "/api/pool/fund", None, amount(10)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(&app, "POST", "/api/pool/fund", Some("bob"), amount(10)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, "POST", "/api/pool/fund", Some(STRANGER), amount(10)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, "POST", "/api/pool/fund", Some(OWNER), amount(10)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["liquidity_minor_units"], 10);

        let (_, body) = call(&app, "GET", "/api/pool/balance", None, None).await;
        assert_eq!(body["liquidity_minor_units"], 10);
    }

    #[tokio::test]
    async fn test_loan_lifecycle() {
        let app = app();
        call(&app, "POST", "/api/pool/fund", Some(OWNER), amount(100_000_000_000)).await;

        let issue = serde_json::json!({ "borrower": FREELANCER, "principal": 10_000_000_000u64 });
        let (status, loan) =
            call(&app, "POST", "/api/loans", Some(OWNER), Some(issue.to_string())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(loan["id"], 0);
        assert_eq!(loan["total_owed_minor_units"], 11_000_000_000u64);
        assert_eq!(loan["status"], "active");

        let (status, _) =
            call(&app, "POST", "/api/loans/0/repay", Some(STRANGER), amount(1)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(
            &app,
            "POST",
            "/api/loans/0/repay",
            Some(FREELANCER),
            amount(12_000_000_000),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, receipt) = call(
            &app,
            "POST",
            "/api/loans/0/repay",
            Some(FREELANCER),
            amount(5_000_000_000),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt["remaining"], 6_000_000_000u64);

        let (_, remaining) = call(&app, "GET", "/api/loans/0/remaining", None, None).await;
        assert_eq!(remaining["remaining_minor_units"], 6_000_000_000u64);

        let (_, receipt) = call(
            &app,
            "POST",
            "/api/loans/0/repay",
            Some(FREELANCER),
            amount(6_000_000_000),
        )
        .await;
        assert_eq!(receipt["fully_repaid"], true);

        let (status, _) =
            call(&app, "POST", "/api/loans/0/repay", Some(FREELANCER), amount(1)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let uri = format!("/api/borrowers/{}/loans", FREELANCER);
        let (_, loans) = call(&app, "GET", &uri, None, None).await;
        assert_eq!(loans["loan_ids"], serde_json::json!([0]));

        let (status, _) = call(&app, "GET", "/api/loans/9", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, page) = call(&app, "GET", "/api/events?kind=loan_repaid", None, None).await;
        assert_eq!(page["total"], 2);

        let (_, active) = call(&app, "GET", "/api/loans?active=true", None, None).await;
        assert_eq!(active, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_evaluate_publish_and_gate() {
        let app = app();
        call(&app, "POST", "/api/pool/fund", Some(OWNER), amount(1_000_000_000)).await;

        let (status, _) = call(
            &app,
            "POST",
            "/api/scores/evaluate",
            Some(STRANGER),
            Some(PAYLOAD.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, decision) = call(
            &app,
            "POST",
            "/api/scores/evaluate",
            Some(FREELANCER),
            Some(PAYLOAD.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decision["credit_score"], 1_000);
        assert_eq!(decision["repayment_count"], 6);

        let uri = format!("/api/scores/{}/decision", FREELANCER);
        let (_, cached) = call(&app, "GET", &uri, None, None).await;
        assert_eq!(cached, decision);

        let gate = serde_json::json!({ "min_credit_score": 700 }).to_string();
        let (status, settings) = call(
            &app,
            "PUT",
            "/api/settings/min-credit-score",
            Some(OWNER),
            Some(gate),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(settings["min_credit_score"], 700);

        let issue = serde_json::json!({ "borrower": FREELANCER, "principal": 1_000_000 }).to_string();
        let (status, _) = call(&app, "POST", "/api/loans", Some(OWNER), Some(issue.clone())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let uri = format!("/api/scores/{}/publish", FREELANCER);
        let (status, _) = call(&app, "POST", &uri, Some(FREELANCER), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, record) = call(&app, "POST", &uri, Some(OWNER), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["score"], 1_000);

        let (status, loan) = call(&app, "POST", "/api/loans", Some(OWNER), Some(issue)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(loan["credit_score_at_issuance"], 1_000);

        let uri = format!("/api/scores/{}/history", FREELANCER);
        let (_, history) = call(&app, "GET", &uri, None, None).await;
        assert_eq!(history[0]["source"], "freelance_scorer");
    }

    #[tokio::test]
    async fn test_manual_score_and_preview() {
        let app = app();

        let uri = format!("/api/scores/{}", STRANGER);
        let (status, _) = call(
            &app,
            "PUT",
            &uri,
            Some(OWNER),
            Some(r#"{"score": 1001}"#.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, record) = call(
            &app,
            "PUT",
            &uri,
            Some(OWNER),
            Some(r#"{"score": 640}"#.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["score"], 640);
        let (_, record) = call(&app, "GET", &uri, None, None).await;
        assert_eq!(record["score"], 640);

        let (status, preview) = call(
            &app,
            "POST",
            "/api/scores/preview",
            None,
            Some(PAYLOAD.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(preview["apr_bps"], 1_000);

        let (_, summary) = call(
            &app,
            "POST",
            "/api/freelancers/summary",
            None,
            Some(PAYLOAD.to_string()),
        )
        .await;
        assert_eq!(summary["platformCount"], 3);

        let empty = r#"{"freelancerAddress": "0xa1b2c3d4", "snapshotTimestampEpoch": 1, "lookbackMonths": 1, "platforms": []}"#;
        let (status, _) = call(
            &app,
            "POST",
            "/api/scores/preview",
            None,
            Some(empty.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_health_with_outstanding_above_u64() {
        let app = app();
        call(&app, "POST", "/api/pool/fund", Some(OWNER), amount(u64::MAX)).await;

        // each loan's total owed fits in u64, their sum does not
        let first = u64::MAX / 10 * 9;
        let issue = serde_json::json!({ "borrower": FREELANCER, "principal": first });
        let (status, _) =
            call(&app, "POST", "/api/loans", Some(OWNER), Some(issue.to_string())).await;
        assert_eq!(status, StatusCode::CREATED);

        let issue = serde_json::json!({ "borrower": STRANGER, "principal": u64::MAX - first });
        let (status, _) =
            call(&app, "POST", "/api/loans", Some(OWNER), Some(issue.to_string())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ledger"]["active_loans"], 2);
        let outstanding = body["ledger"]["outstanding_minor_units"]
            .as_f64()
            .unwrap();
        assert!(outstanding > u64::MAX as f64);
    }

    #[tokio::test]
    async fn test_score_breakdown() {
        let app = app();
        let (status, report) = call(
            &app,
            "POST",
            "/api/scores/breakdown",
            None,
            Some(PAYLOAD.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["breakdown"]["annual_income"], 400);
        assert_eq!(report["breakdown"]["history_length"], 144);
        assert_eq!(report["breakdown"]["platform_diversity"], 200);
        assert_eq!(report["breakdown"]["payment_reliability"], 145);
        assert_eq!(report["decision"]["credit_score"], 1_000);

        // breakdown does not cache a decision
        let uri = format!("/api/scores/{}/decision", FREELANCER);
        let (_, cached) = call(&app, "GET", &uri, None, None).await;
        assert_eq!(cached["credit_score"], 0);
    }

    #[tokio::test]
    async fn test_event_paging_bounds() {
        let app = app();
        call(&app, "POST", "/api/pool/fund", Some(OWNER), amount(10)).await;

        for uri in ["/api/events?page=0", "/api/events?page_size=0", "/api/events?page_size=101"] {
            let (status, body) = call(&app, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["status"], 400);
        }

        let (status, page) = call(&app, "GET", "/api/events?page=1&page_size=100", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
    }

    #[tokio::test]
    async fn test_malformed_input_uses_error_envelope() {
        let app = app();

        let (status, body) = call(
            &app,
            "POST",
            "/api/pool/fund",
            Some(OWNER),
            Some("{not json".to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["error"].is_string());

        let (status, body) = call(
            &app,
            "POST",
            "/api/pool/fund",
            Some(OWNER),
            Some(r#"{"amount": "ten"}"#.to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], 422);

        let (status, body) = call(&app, "GET", "/api/loans/abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = call(&app, "GET", "/api/events?page=x", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}
