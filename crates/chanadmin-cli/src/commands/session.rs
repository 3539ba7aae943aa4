use chanadmin_client::SystemApi;
use serde_json::json;

use crate::cli::{LoginArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, api_failure, session_failure};

pub(crate) async fn handle_login(ctx: &AppContext, args: LoginArgs) -> CliResult<()> {
    ctx.session
        .sign_in(&args.token)
        .map_err(|err| session_failure(err, &ctx.bundle))?;

    if !args.skip_verify {
        // A 401 here clears the token that was just stored.
        ctx.api
            .system_config()
            .await
            .map_err(|err| api_failure(err, &ctx.bundle))?;
    }

    tracing::info!("token stored");
    println!("{}", ctx.bundle.text("auth.signedIn"));
    Ok(())
}

pub(crate) fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    ctx.session.sign_out().map_err(CliError::failure)?;
    println!("{}", ctx.bundle.text("auth.signedOut"));
    Ok(())
}

pub(crate) fn handle_whoami(ctx: &AppContext) -> CliResult<()> {
    let token = ctx.session.token();
    match ctx.output {
        OutputFormat::Json => {
            let value = json!({
                "authenticated": token.is_some(),
                "token_hint": token.as_deref().map(mask_token),
            });
            let text = serde_json::to_string_pretty(&value).map_err(CliError::failure)?;
            println!("{text}");
        }
        OutputFormat::Table => match token {
            Some(token) => println!(
                "{} ({}: {})",
                ctx.bundle.text("auth.signedIn"),
                ctx.bundle.text("auth.token"),
                mask_token(&token)
            ),
            None => println!("{}", ctx.bundle.text("auth.signedOut")),
        },
    }
    Ok(())
}

/// Keep only the last four characters of a token.
fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("****{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::client::CliDependencies;
    use crate::commands::test_support::{context_with, domains_json};
    use anyhow::Result;
    use clap::Parser;
    use httpmock::prelude::*;
    use std::path::Path;

    fn file_context(server: &MockServer, path: &Path) -> Result<AppContext> {
        let base_url = server.base_url();
        let token_file = path.display().to_string();
        let cli = Cli::try_parse_from([
            "chanadmin",
            "--api-url",
            base_url.as_str(),
            "--token-file",
            token_file.as_str(),
            "whoami",
        ])?;
        let deps = CliDependencies::from_cli(&cli, "trace-test")?;
        Ok(AppContext::new(deps, OutputFormat::Table))
    }

    #[tokio::test]
    async fn login_verifies_and_keeps_token() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/admin/system/config")
                .header("authorization", "Bearer fresh-token");
            then.status(200).json_body(domains_json());
        });

        let ctx = context_with(&server, None)?;
        handle_login(
            &ctx,
            LoginArgs {
                token: "  fresh-token ".into(),
                skip_verify: false,
            },
        )
        .await?;
        mock.assert();
        assert_eq!(ctx.session.token().as_deref(), Some("fresh-token"));
        Ok(())
    }

    #[tokio::test]
    async fn rejected_token_is_cleared() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/admin/system/config");
            then.status(401);
        });

        let ctx = context_with(&server, None)?;
        let err = handle_login(
            &ctx,
            LoginArgs {
                token: "stale".into(),
                skip_verify: false,
            },
        )
        .await
        .expect_err("login should fail");
        assert_eq!(err.exit_code(), 4);
        assert!(!ctx.session.is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn blank_token_is_rejected_without_request() -> Result<()> {
        let server = MockServer::start_async().await;
        let ctx = context_with(&server, None)?;
        let err = handle_login(
            &ctx,
            LoginArgs {
                token: "   ".into(),
                skip_verify: true,
            },
        )
        .await
        .expect_err("blank token");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), "Token is required");
        Ok(())
    }

    #[tokio::test]
    async fn logout_forgets_token() -> Result<()> {
        let server = MockServer::start_async().await;
        let ctx = context_with(&server, Some("abc"))?;
        handle_logout(&ctx)?;
        assert!(ctx.session.token().is_none());
        handle_whoami(&ctx)?;
        Ok(())
    }

    #[tokio::test]
    async fn token_file_persists_across_invocations() -> Result<()> {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("session.json");

        let first = file_context(&server, &path)?;
        handle_login(
            &first,
            LoginArgs {
                token: "persisted-token".into(),
                skip_verify: true,
            },
        )
        .await?;
        assert!(path.exists());

        let second = file_context(&server, &path)?;
        assert_eq!(second.session.token().as_deref(), Some("persisted-token"));
        handle_logout(&second)?;
        assert!(!path.exists());

        let third = file_context(&server, &path)?;
        assert!(third.session.token().is_none());
        Ok(())
    }

    #[test]
    fn mask_keeps_last_four_characters() {
        assert_eq!(mask_token("abcdefgh"), "****efgh");
        assert_eq!(mask_token("abc"), "****");
    }
}
