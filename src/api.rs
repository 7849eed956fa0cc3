//! Transport-agnostic request handling.
//!
//! A request is a method plus a JSON body `{"rulebook": "..."}`. The
//! rulebook string is a path to a rulebook file, or inline rulebook text.
//! Whatever happens while checking, an accepted request answers with the
//! report as a JSON array of [`RuleResponse`]. Only malformed requests are
//! rejected, with a 4xx status and no report.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::check::{CheckOptions, Checker, Report, RuleOutcome};
use crate::token::Token;

/// Name given to inline rulebook text in tokens.
pub const INLINE_ORIGIN: &str = "<inline>";

/// One located span in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub file: String,
    pub row: usize,
    pub col: usize,
    pub length: usize,
}

impl From<&Token> for TokenResponse {
    fn from(token: &Token) -> Self {
        Self {
            file: token.file.display().to_string(),
            row: token.row,
            col: token.col,
            length: token.length,
        }
    }
}

/// One outcome in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResponse {
    pub passed: bool,
    pub result_comment: String,
    pub token_list: Vec<TokenResponse>,
}

impl From<&RuleOutcome> for RuleResponse {
    fn from(outcome: &RuleOutcome) -> Self {
        Self {
            passed: outcome.passed,
            result_comment: outcome.comment.clone(),
            token_list: outcome.tokens.iter().map(TokenResponse::from).collect(),
        }
    }
}

impl RuleResponse {
    /// The response array for a whole report, in report order.
    pub fn from_report(report: &Report) -> Vec<Self> {
        report.outcomes().iter().map(Self::from).collect()
    }
}

#[derive(Debug, Deserialize)]
struct CheckRequest {
    rulebook: String,
}

/// How accepted requests are run.
#[derive(Debug, Clone)]
pub struct ApiOptions {
    pub check: CheckOptions,
    /// Deadline for the whole check; `None` never times out.
    pub timeout: Option<Duration>,
    /// Relative rulebook paths, and relative file paths in inline
    /// rulebooks, resolve against this directory.
    pub base_dir: PathBuf,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            check: CheckOptions::default(),
            timeout: None,
            base_dir: PathBuf::new(),
        }
    }
}

/// The answer to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    /// The request was accepted and checked.
    Report(Vec<RuleResponse>),
    /// The request was refused before any check ran.
    Rejected { status: u16, message: String },
}

impl ApiResponse {
    fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// HTTP-equivalent status code.
    pub fn status(&self) -> u16 {
        match self {
            Self::Report(_) => 200,
            Self::Rejected { status, .. } => *status,
        }
    }

    /// Response body: the report array, or an error object.
    pub fn body(&self) -> String {
        let value = match self {
            Self::Report(responses) => serde_json::json!(responses),
            Self::Rejected { message, .. } => serde_json::json!({ "error": message }),
        };
        value.to_string()
    }
}

/// Where the rulebook string of a request points.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RulebookRef {
    Path(PathBuf),
    Inline(String),
}

fn classify(rulebook: &str, base_dir: &Path) -> RulebookRef {
    let candidate = base_dir.join(rulebook);
    if !candidate.is_file() && looks_inline(rulebook) {
        RulebookRef::Inline(rulebook.to_string())
    } else {
        // Anything else that names no file still goes to loading, which
        // reports it as missing.
        RulebookRef::Path(candidate)
    }
}

/// Multi-line text, a flow mapping, or a `key: value` pair.
fn looks_inline(rulebook: &str) -> bool {
    rulebook.contains('\n') || rulebook.trim_start().starts_with('{') || rulebook.contains(": ")
}

/// Handle one request.
pub fn handle(method: &str, body: &str, options: &ApiOptions) -> ApiResponse {
    if !method.eq_ignore_ascii_case("POST") {
        debug!("Rejected {} request", method);
        return ApiResponse::rejected(405, format!("method {} not allowed; use POST", method));
    }
    let request: CheckRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(e) => return ApiResponse::rejected(400, format!("malformed request body: {}", e)),
    };
    if request.rulebook.trim().is_empty() {
        return ApiResponse::rejected(400, "malformed request body: rulebook is empty");
    }

    let cancel = match options.timeout {
        Some(timeout) => CancellationToken::with_timeout(timeout),
        None => CancellationToken::new(),
    };
    let mut checker = Checker::new(options.check);
    let report = match classify(&request.rulebook, &options.base_dir) {
        RulebookRef::Path(path) => checker.check_path(&path, &cancel),
        RulebookRef::Inline(text) => {
            checker.check_text(&text, Path::new(INLINE_ORIGIN), &options.base_dir, &cancel)
        }
    };
    info!(
        "Request checked: {} outcome(s), passed = {}",
        report.len(),
        report.passed()
    );
    ApiResponse::Report(RuleResponse::from_report(&report))
}
