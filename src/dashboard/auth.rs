//! Dashboard credentials: API key or OAuth authorization code.

use crate::config::{self, Config};
use crate::error::AuthError;
use clap::ValueEnum;
use serde::Deserialize;
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AuthMethod {
    /// Personal API key from MERAKI_API_KEY.
    #[default]
    ApiKey,
    /// OAuth authorization-code flow with manual code entry.
    Oauth,
}

#[derive(Deserialize, Debug)]
struct TokenResponse {
    access_token: String,
}

/// Obtain the bearer token for `method`. Nothing is sent to the API itself.
pub async fn get_auth_token(method: AuthMethod, config: &Config) -> Result<String, AuthError> {
    match method {
        AuthMethod::ApiKey => api_key(config),
        AuthMethod::Oauth => {
            let stdin = std::io::stdin();
            oauth_token(config, &mut stdin.lock()).await
        }
    }
}

fn api_key(config: &Config) -> Result<String, AuthError> {
    config.api_key.clone().ok_or(AuthError::MissingApiKey)
}

/// Authorize URL the operator opens in a browser.
pub fn authorization_url(config: &Config) -> Result<String, AuthError> {
    let client_id = config
        .client_id
        .as_deref()
        .ok_or(AuthError::MissingOAuthClient)?;
    let url = reqwest::Url::parse_with_params(
        config::OAUTH_AUTHORIZE_URL,
        &[
            ("response_type", "code"),
            ("client_id", client_id),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", config::OAUTH_SCOPE),
        ],
    )
    .map_err(|e| AuthError::TokenExchange(e.to_string()))?;
    Ok(url.to_string())
}

/// First non-empty line of `input`, trimmed.
pub fn read_code(input: &mut impl BufRead) -> Result<String, AuthError> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let code = line.trim();
    if code.is_empty() {
        return Err(AuthError::NoAuthorizationCode);
    }
    Ok(code.to_string())
}

async fn oauth_token(config: &Config, input: &mut impl BufRead) -> Result<String, AuthError> {
    let (client_id, client_secret) = match (&config.client_id, &config.client_secret) {
        (Some(id), Some(secret)) => (id, secret),
        _ => return Err(AuthError::MissingOAuthClient),
    };
    let url = authorization_url(config)?;

    println!("\nOAuth Authorization Required");
    println!("Open this URL in your browser and authorize the app:");
    println!("{url}");
    println!("\nAfter authorizing, copy the code from the response and paste it below.");
    println!("Enter the authorization code: ");
    let code = read_code(input)?;

    log::info!("exchanging authorization code at {}", config::OAUTH_TOKEN_URL);
    let response = reqwest::Client::new()
        .post(config::OAUTH_TOKEN_URL)
        .basic_auth(client_id, Some(client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AuthError::TokenExchange(e.to_string()))?;
    if !status.is_success() {
        return Err(AuthError::TokenExchange(format!("HTTP {status}: {text}")));
    }
    let token: TokenResponse = serde_json::from_str(&text)
        .map_err(|e| AuthError::TokenExchange(format!("unexpected token response: {e}")))?;
    Ok(token.access_token)
}
