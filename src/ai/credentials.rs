use keyring::Entry;

const SERVICE_NAME: &str = "com.reqflow.pipeline";

/// Remote provider whose key is being resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyedProvider {
    Gemini,
    OpenAi,
}

impl KeyedProvider {
    /// Keychain account name
    pub fn account(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }

    /// Environment variable checked before the keychain
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Resolves API keys from the environment, then the OS keychain.
/// Keys are never compiled into the binary.
pub struct CredentialManager;

impl CredentialManager {
    /// Get an API key for a provider
    pub fn get_api_key(provider: KeyedProvider) -> Result<String, String> {
        Self::resolve_with(provider, |var| std::env::var(var).ok(), Self::from_keychain)
    }

    /// Check if an API key is configured
    pub fn has_api_key(provider: KeyedProvider) -> bool {
        Self::get_api_key(provider).is_ok()
    }

    fn from_keychain(provider: KeyedProvider) -> Option<String> {
        Self::read_keychain(SERVICE_NAME, provider.account())
    }

    fn read_keychain(service: &str, account: &str) -> Option<String> {
        let entry = match Entry::new(service, account) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("[Credentials] Keychain unavailable: {}", e);
                return None;
            }
        };

        match entry.get_password() {
            Ok(password) => Some(password),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                tracing::debug!("[Credentials] Keychain read failed for {}: {}", account, e);
                None
            }
        }
    }

    fn resolve_with<E, K>(provider: KeyedProvider, env: E, keychain: K) -> Result<String, String>
    where
        E: Fn(&str) -> Option<String>,
        K: Fn(KeyedProvider) -> Option<String>,
    {
        if let Some(key) = env(provider.env_var()).filter(|k| !k.trim().is_empty()) {
            tracing::debug!("[Credentials] Using {} from environment", provider.env_var());
            return Ok(key.trim().to_string());
        }

        if let Some(key) = keychain(provider).filter(|k| !k.trim().is_empty()) {
            tracing::debug!("[Credentials] Using keychain entry for {}", provider.account());
            return Ok(key.trim().to_string());
        }

        Err(format!(
            "{} API key not configured (set {} or store it in the keychain)",
            provider.account(),
            provider.env_var()
        ))
    }
}
