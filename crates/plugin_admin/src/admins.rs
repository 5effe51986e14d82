//! The set of logins allowed to run admin commands.

use dashmap::DashSet;
use tracing::warn;

#[derive(Debug, Default)]
pub struct AdminList {
    logins: DashSet<String>,
}

impl AdminList {
    pub fn new<I, S>(logins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = Self::default();
        for login in logins {
            list.logins.insert(login.into());
        }
        list
    }

    pub fn is_admin(&self, login: &str) -> bool {
        self.logins.contains(login)
    }

    /// Grants admin rights. Returns false if `login` already had them.
    pub fn add(&self, login: &str) -> bool {
        let added = self.logins.insert(login.to_string());
        if added {
            warn!("🔑 Added login {} as an admin", login);
        }
        added
    }

    pub fn len(&self) -> usize {
        self.logins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logins.is_empty()
    }
}
