//! Local user creation. Remote accounts come in through the
//! dereferencer; local ones are born here at signup.

use crate::error::Error;
use crate::globals::GLOBALS;
use crate::model::{Account, AccountSettings, Id, User};
use chrono::Utc;

/// Resolve the locale for a new signup: the requested locale wins, then
/// the instance's first preferred language, then English.
pub fn signup_locale(requested: &str, instance_languages: &[String]) -> String {
    if !requested.is_empty() {
        return requested.to_owned();
    }
    instance_languages
        .iter()
        .find(|l| !l.is_empty())
        .cloned()
        .unwrap_or_else(|| "en".to_owned())
}

/// Create a local account and its user record.
pub async fn create_user_account(
    username: &str,
    locale: &str,
    email: Option<String>,
) -> Result<(Account, User), Error> {
    let store = GLOBALS.store();

    let (host, languages) = {
        let settings = GLOBALS.settings.read();
        (settings.instance_host.clone(), settings.instance_languages.clone())
    };
    let locale = signup_locale(locale, &languages);

    let mut account = Account::new_local(username, &format!("https://{host}/users/{username}"));
    account.settings = Some(AccountSettings {
        language: locale.clone(),
        rss_enabled: false,
    });
    store.put_account(&account).await?;

    let user = User {
        id: Id::gen(),
        account_id: account.id,
        email,
        locale,
        created_at: Utc::now(),
    };
    store.put_user(&user).await?;

    tracing::info!("created local account @{username}");
    Ok((account, user))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_signup_locale_requested_wins() {
        let langs = vec!["nl".to_owned(), "en-gb".to_owned()];
        assert_eq!(signup_locale("be", &langs), "be");
    }

    #[test]
    fn test_signup_locale_falls_back_to_instance() {
        let langs = vec!["nl".to_owned(), "en-gb".to_owned()];
        assert_eq!(signup_locale("", &langs), "nl");
    }

    #[test]
    fn test_signup_locale_defaults_to_english() {
        assert_eq!(signup_locale("", &[]), "en");
    }
}
