// Import necessary crates and modules
use keyring::Entry;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::process::exit;

/// Structure to hold HOTS English platform credentials.
///
/// This struct stores the base URL of the platform's data service and the API
/// token required to access it, together with the HTTP client reused across
/// requests.
///
/// Fields:
/// - `url_platform`: Base URL for the platform data service.
/// - `token_platform`: API token for authentication.
/// - `client`: Shared blocking HTTP client (not serialized).
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct PlatformCredentials {
    pub url_platform: String,
    pub token_platform: String,
    #[serde(skip)]
    pub client: Client,
}

// Enum to represent the source of platform credentials.
enum PlatformCredentialType {
    None,                                  // No credentials available
    EnvVariables(PlatformCredentials),     // Credentials loaded from environment variables
    ConfigFile(PlatformCredentials),       // Credentials loaded from the user config directory
    SystemKeyring(PlatformCredentials),    // Credentials loaded from the system's keyring
}

impl PlatformCredentials {
    /// Tests the validity of platform credentials.
    ///
    /// Performs a GET request against the data service to verify that the
    /// provided token is accepted.
    ///
    /// Returns:
    /// - `Ok(200)`: If credentials are valid.
    /// - `Err(u16)`: The HTTP status code if credentials are invalid, or 0 for
    ///   generic network errors.
    fn test_platform_credentials(api_url: &str, access_token: &str) -> Result<u16, u16> {
        let client = Client::new();
        let res = client
            .get(format!("{}/users/self", api_url))
            .header("Authorization", format!("Bearer {}", access_token))
            .send();

        match res {
            Ok(response) => {
                if response.status().is_success() {
                    Ok(200)
                } else {
                    Err(response.status().as_u16())
                }
            }
            Err(_) => Err(0),
        }
    }

    /// Loads platform credentials from environment variables, when the
    /// `use_env_credentials` feature is enabled.
    pub fn load_credentials_from_env() -> Result<PlatformCredentials, String> {
        #[cfg(not(feature = "use_env_credentials"))]
        {
            return Err("Feature not enabled".to_string());
        }

        #[cfg(feature = "use_env_credentials")]
        {
            match std::env::var("HOTS_URL") {
                Ok(url) => match std::env::var("HOTS_TOKEN") {
                    Ok(token) => {
                        println!("Credentials loaded from environment! -> {}", url);
                        Ok(PlatformCredentials {
                            url_platform: url,
                            token_platform: token,
                            client: Client::new(),
                        })
                    }
                    Err(_) => Err("Error retrieving token from environment".to_string()),
                },
                Err(_) => Err("Error retrieving URL from environment".to_string()),
            }
        }
    }

    // Path of the credentials file under the user's config directory.
    fn credentials_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hots_english").join("credentials.json"))
    }

    /// Loads platform credentials from the user's config directory.
    ///
    /// Reads `credentials.json` under the config directory (e.g.
    /// `~/.config/hots_english/` on Linux) and deserializes it.
    ///
    /// Returns:
    /// - `Ok(PlatformCredentials)`: Credentials if the file exists and parses.
    /// - `Err(String)`: Error message otherwise.
    pub fn load_credentials_from_file() -> Result<PlatformCredentials, String> {
        let path = match Self::credentials_file_path() {
            Some(path) => path,
            None => return Err("No config directory available".to_string()),
        };

        let raw = fs::read_to_string(&path)
            .map_err(|_| format!("Error reading credentials file {}", path.display()))?;

        serde_json::from_str(&raw)
            .map_err(|_| format!("Error parsing credentials file {}", path.display()))
    }

    /// Loads platform credentials from the system's keyring.
    ///
    /// Returns:
    /// - `Ok(PlatformCredentials)`: Credentials if successfully retrieved.
    /// - `Err(String)`: Error message if issues occur accessing the keyring.
    pub fn load_credentials_from_system() -> Result<PlatformCredentials, String> {
        let app_name = env!("CARGO_PKG_NAME");
        match Entry::new(app_name, "URL_PLATFORM") {
            Ok(entry) => match entry.get_password() {
                Ok(url) => match Entry::new(app_name, "TOKEN_PLATFORM") {
                    Ok(entry) => match entry.get_password() {
                        Ok(token) => Ok(PlatformCredentials {
                            url_platform: url,
                            token_platform: token,
                            client: Client::new(),
                        }),
                        Err(_) => Err("Error retrieving token from system".to_string()),
                    },
                    Err(_) => Err("Error retrieving token from system".to_string()),
                },
                Err(_) => Err("Error retrieving URL from system".to_string()),
            },
            Err(_) => Err("Error retrieving URL from system".to_string()),
        }
    }

    /// Loads the platform credentials, trying environment variables, then the
    /// config file, then the system's keyring.
    fn load_credentials() -> PlatformCredentialType {
        match Self::load_credentials_from_env() {
            Ok(credentials) => PlatformCredentialType::EnvVariables(credentials),
            Err(_) => match Self::load_credentials_from_file() {
                Ok(credentials) => PlatformCredentialType::ConfigFile(credentials),
                Err(_) => match Self::load_credentials_from_system() {
                    Ok(credentials) => PlatformCredentialType::SystemKeyring(credentials),
                    Err(_) => PlatformCredentialType::None,
                },
            },
        }
    }

    /// Interactively sets and stores platform credentials in the system's keyring.
    ///
    /// Prompts the user to enter the data service URL and token, stores them in
    /// the keyring and validates them against the platform.
    fn set_system_credentials() -> PlatformCredentialType {
        let app_name = env!("CARGO_PKG_NAME");
        loop {
            // Prompt user to enter credentials
            println!("Do you wish to register the credentials? (y/n)");
            let mut input = String::new();
            std::io::stdin().read_line(&mut input).unwrap();
            if input.trim().to_uppercase() != "Y" {
                return PlatformCredentialType::None;
            }
            println!("Enter the platform URL:");
            input.clear();
            std::io::stdin().read_line(&mut input).unwrap();
            let url = input.trim().to_string();
            println!("Enter the platform token:");
            input.clear();
            std::io::stdin().read_line(&mut input).unwrap();
            let token = input.trim().to_string();

            // Save entered credentials to the system's keyring
            if let Err(e) = Entry::new(app_name, "URL_PLATFORM")
                .unwrap()
                .set_password(&url)
            {
                eprintln!("Error saving URL: {}", e);
                continue;
            }
            if let Err(e) = Entry::new(app_name, "TOKEN_PLATFORM")
                .unwrap()
                .set_password(&token)
            {
                eprintln!("Error saving token: {}", e);
                continue;
            }

            // Validate the credentials against the platform
            match Self::test_platform_credentials(&url, &token) {
                Ok(_) => {
                    return PlatformCredentialType::SystemKeyring(PlatformCredentials {
                        url_platform: url,
                        token_platform: token,
                        client: Client::new(),
                    });
                }
                Err(status_code) if status_code == 401 || status_code == 403 => {
                    println!("Incorrect credentials");
                    continue;
                }
                Err(status_code) => {
                    println!("Error accessing the platform - Status Code {}", status_code);
                    exit(1);
                }
            }
        }
    }

    /// Retrieves platform credentials, using stored ones or prompting the user
    /// to input them.
    ///
    /// This is the primary entry point for obtaining credentials. It first
    /// attempts to load existing credentials; if none are found it prompts the
    /// user, and in either case validates the result against the platform.
    pub fn credentials() -> PlatformCredentials {
        match Self::load_credentials() {
            PlatformCredentialType::None => match Self::set_system_credentials() {
                PlatformCredentialType::SystemKeyring(credentials) => credentials,
                _ => {
                    println!("Error obtaining credentials");
                    exit(1);
                }
            },
            PlatformCredentialType::EnvVariables(credentials)
            | PlatformCredentialType::ConfigFile(credentials)
            | PlatformCredentialType::SystemKeyring(credentials) => {
                match Self::test_platform_credentials(
                    &credentials.url_platform,
                    &credentials.token_platform,
                ) {
                    Ok(_) => credentials,
                    Err(e) => {
                        println!("Error accessing the platform - Status Code {}", e);
                        exit(1);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_credentials_initialization() {
        let url = String::from("https://example.com");
        let token = String::from("secret-token");

        let credentials = PlatformCredentials {
            url_platform: url,
            token_platform: token,
            client: Client::new(),
        };

        assert_eq!(credentials.url_platform, "https://example.com");
        assert_eq!(credentials.token_platform, "secret-token");
    }

    #[test]
    #[cfg(feature = "use_env_credentials")]
    fn test_load_credentials_from_env() {
        use std::collections::HashMap;
        use std::env;

        let mut map: HashMap<String, String> = HashMap::new();
        fn set_new_key(map: &mut HashMap<String, String>, key: &str, value: &str) {
            if let Ok(value) = env::var(key) {
                map.insert(key.to_string(), value);
            }
            env::set_var(key, value);
        }

        fn restore_key(map: &HashMap<String, String>, key: &str) {
            if let Some(value) = map.get(key) {
                env::set_var(key, value);
            } else {
                env::remove_var(key);
            }
        }

        let platform_url_key = "HOTS_URL";
        let platform_token_key = "HOTS_TOKEN";

        set_new_key(&mut map, platform_url_key, "https://example.com");
        set_new_key(&mut map, platform_token_key, "secret-token");

        // Test both variables set
        let both_credentials = PlatformCredentials::load_credentials_from_env();

        // Test only URL set
        env::remove_var(platform_token_key);
        let only_url = PlatformCredentials::load_credentials_from_env();

        // Test only token set
        env::remove_var(platform_url_key);
        env::set_var(platform_token_key, "secret-token");
        let only_token = PlatformCredentials::load_credentials_from_env();

        // Test no variables set
        env::remove_var(platform_token_key);
        let no_credentials = PlatformCredentials::load_credentials_from_env();

        restore_key(&map, platform_token_key);
        restore_key(&map, platform_url_key);

        assert!(both_credentials.is_ok());
        assert!(only_url.is_err());
        assert!(only_token.is_err());
        assert!(no_credentials.is_err());
    }
}
