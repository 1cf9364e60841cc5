//! Subcommand implementations.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use panel_auth::{SigningConfig, TokenIssuer, TokenMeta};
use tracing::info;

#[derive(Debug)]
pub struct IssueArgs {
    pub client_id: String,
    pub user_id: Option<String>,
    pub scope: String,
    pub expires_in: u32,
    pub refresh: bool,
}

#[derive(Debug)]
pub enum Action {
    Issue { signing: SigningConfig, args: IssueArgs },
    Verify { signing: SigningConfig, token: String },
}

impl Action {
    /// Run the action and return what should be printed.
    pub fn execute(self) -> Result<String> {
        match self {
            Self::Issue { signing, args } => issue(signing, args),
            Self::Verify { signing, token } => verify(signing, &token),
        }
    }
}

fn issue(signing: SigningConfig, args: IssueArgs) -> Result<String> {
    let issuer = TokenIssuer::new(signing);
    let meta = TokenMeta {
        created_at: Utc::now(),
        expires_in: Duration::seconds(i64::from(args.expires_in)),
        scope: args.scope,
    };

    let tokens = issuer
        .issue_for(&args.client_id, args.user_id.as_deref(), &meta, args.refresh)
        .context("issuing token")?;
    info!(client_id = %args.client_id, expired_at = tokens.expired_at, "token issued");

    serde_json::to_string_pretty(&tokens).context("encoding output")
}

fn verify(signing: SigningConfig, token: &str) -> Result<String> {
    let issuer = TokenIssuer::new(signing);
    let claims = issuer
        .verify(token.trim(), Utc::now())
        .context("token rejected")?;

    let mut out = serde_json::to_value(&claims).context("encoding output")?;
    if let (Some(expires), Some(object)) = (claims.expires_at(), out.as_object_mut()) {
        object.insert("expires".into(), expires.to_rfc3339().into());
    }
    serde_json::to_string_pretty(&out).context("encoding output")
}
