use std::io::{self, Read};

use crate::cli::AuthCommands;
use crate::credentials::{KeyringCredentials, TokenSource, ACCESS_TOKEN_ENV};
use crate::error::CliError;

pub fn run_auth(command: AuthCommands, credentials: &KeyringCredentials) -> Result<(), CliError> {
    match command {
        AuthCommands::SetToken { token } => {
            let token = match token {
                Some(token) => token,
                None => {
                    let mut buffer = String::new();
                    io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            credentials.store_token(&token)?;
            println!("Access token saved to the system keyring");
        }
        AuthCommands::Status => println!("{}", describe_token_source(credentials.source()?)),
        AuthCommands::Clear => {
            credentials.clear()?;
            println!("Access token removed from the system keyring");
        }
    }
    Ok(())
}

pub fn describe_token_source(source: TokenSource) -> String {
    match source {
        TokenSource::Environment => format!("Using access token from {ACCESS_TOKEN_ENV}"),
        TokenSource::Keyring => "Using access token stored in the system keyring".to_string(),
        TokenSource::Missing => {
            format!("Not signed in. Run `ucgator auth set-token` or set {ACCESS_TOKEN_ENV}.")
        }
    }
}
