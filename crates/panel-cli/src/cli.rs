//! Command-line definition and argument extraction.

use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use jsonwebtoken::Algorithm;
use panel_auth::SigningConfig;
use panel_core::models::scope;

use crate::actions::{Action, IssueArgs};

fn signing_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("algorithm")
                .long("algorithm")
                .help("JWS algorithm (HS256, RS256, ES256, EdDSA, ...)")
                .env("PANEL_SIGNING_ALGORITHM")
                .default_value("HS256")
                .global(true),
        )
        .arg(
            Arg::new("secret")
                .long("secret")
                .help("Shared secret for the HS* algorithms")
                .env("PANEL_SIGNING_SECRET")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new("private-key")
                .long("private-key")
                .help("Path to the PEM private key for asymmetric algorithms")
                .env("PANEL_SIGNING_PRIVATE_KEY")
                .global(true),
        )
        .arg(
            Arg::new("public-key")
                .long("public-key")
                .help("Path to the PEM public key for asymmetric algorithms")
                .env("PANEL_SIGNING_PUBLIC_KEY")
                .global(true),
        )
}

#[must_use]
pub fn command() -> Command {
    let issue = Command::new("issue")
        .about("Sign an access token and print it as JSON")
        .arg(
            Arg::new("client-id")
                .long("client-id")
                .help("OAuth2 client the token is issued to")
                .required(true),
        )
        .arg(
            Arg::new("user-id")
                .long("user-id")
                .help("User the token acts for; omit for client-only grants"),
        )
        .arg(
            Arg::new("scope")
                .long("scope")
                .help("Scope to grant; repeat or delimit with spaces or commas")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("expires-in")
                .long("expires-in")
                .help("Lifetime in seconds")
                .default_value("3600")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("refresh")
                .long("refresh")
                .help("Also derive a refresh token")
                .action(ArgAction::SetTrue),
        );

    let verify = Command::new("verify")
        .about("Check a token's signature and expiry and print its claims")
        .arg(Arg::new("token").help("Compact JWS").required(true));

    signing_args(
        Command::new("panelctl")
            .about(env!("CARGO_PKG_DESCRIPTION"))
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg_required_else_help(true)
            .subcommand(issue)
            .subcommand(verify),
    )
}

fn read_pem(matches: &ArgMatches, id: &str) -> Result<String> {
    let path = matches
        .get_one::<String>(id)
        .with_context(|| format!("--{id} is required for asymmetric algorithms"))?;
    std::fs::read_to_string(path).with_context(|| format!("reading {path}"))
}

pub fn signing_config(matches: &ArgMatches) -> Result<SigningConfig> {
    let name = matches
        .get_one::<String>("algorithm")
        .map(String::as_str)
        .unwrap_or("HS256");
    let algorithm =
        Algorithm::from_str(name).with_context(|| format!("unknown algorithm {name}"))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            let secret = matches
                .get_one::<String>("secret")
                .context("--secret is required for HMAC algorithms")?;
            if secret.is_empty() {
                bail!("signing secret must not be empty");
            }
            Ok(SigningConfig::hmac(algorithm, secret.as_bytes().to_vec()))
        }
        _ => Ok(SigningConfig::pem(
            algorithm,
            read_pem(matches, "private-key")?,
            read_pem(matches, "public-key")?,
        )),
    }
}

pub fn dispatch(matches: &ArgMatches) -> Result<Action> {
    let signing = signing_config(matches)?;

    match matches.subcommand() {
        Some(("issue", sub)) => Ok(Action::Issue {
            signing,
            args: IssueArgs {
                client_id: sub
                    .get_one::<String>("client-id")
                    .cloned()
                    .context("missing required argument: --client-id")?,
                user_id: sub.get_one::<String>("user-id").cloned(),
                scope: sub
                    .get_many::<String>("scope")
                    .map(|values| scope::join(&values.collect::<Vec<_>>()))
                    .unwrap_or_default(),
                expires_in: sub.get_one::<u32>("expires-in").copied().unwrap_or(3600),
                refresh: sub.get_flag("refresh"),
            },
        }),
        Some(("verify", sub)) => Ok(Action::Verify {
            signing,
            token: sub
                .get_one::<String>("token")
                .cloned()
                .context("missing token")?,
        }),
        _ => bail!("no subcommand given"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ArgMatches {
        command().try_get_matches_from(args).unwrap()
    }

    #[test]
    fn command_definition_is_valid() {
        command().debug_assert();
    }

    #[test]
    fn issue_arguments() {
        let matches = parse(&[
            "panelctl",
            "--secret",
            "s3cret",
            "issue",
            "--client-id",
            "c1",
            "--scope",
            "login",
            "--scope",
            "servers.view",
            "--expires-in",
            "60",
            "--refresh",
        ]);
        match dispatch(&matches).unwrap() {
            Action::Issue { signing, args } => {
                assert_eq!(signing.algorithm, Algorithm::HS256);
                assert_eq!(args.client_id, "c1");
                assert_eq!(args.user_id, None);
                assert_eq!(args.scope, "login servers.view");
                assert_eq!(args.expires_in, 60);
                assert!(args.refresh);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn scope_defaults_to_empty() {
        let matches = parse(&["panelctl", "--secret", "k", "issue", "--client-id", "c1"]);
        match dispatch(&matches).unwrap() {
            Action::Issue { args, .. } => assert_eq!(args.scope, ""),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn global_signing_flags_after_subcommand() {
        let matches = parse(&["panelctl", "verify", "tok", "--algorithm", "HS512", "--secret", "k"]);
        match dispatch(&matches).unwrap() {
            Action::Verify { signing, token } => {
                assert_eq!(signing.algorithm, Algorithm::HS512);
                assert_eq!(token, "tok");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn hmac_without_secret_is_an_error() {
        let matches = parse(&["panelctl", "--algorithm", "HS256", "verify", "tok"]);
        // PANEL_SIGNING_SECRET may be set in the environment running the tests.
        if matches.get_one::<String>("secret").is_none() {
            assert!(dispatch(&matches).is_err());
        }
    }

    #[test]
    fn unknown_algorithm_is_an_error() {
        let matches = parse(&["panelctl", "--algorithm", "XX999", "--secret", "k", "verify", "t"]);
        assert!(dispatch(&matches).is_err());
    }

    #[test]
    fn missing_client_id_is_rejected_by_clap() {
        assert!(
            command()
                .try_get_matches_from(["panelctl", "--secret", "k", "issue"])
                .is_err()
        );
    }
}
