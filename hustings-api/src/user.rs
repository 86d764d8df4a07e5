use uuid::Uuid;

use crate::STUB_UUID;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_UUID)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Admin,
}

/// One row of either profile table. All columns are nullable upstream.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Profile {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Profile {
    pub fn is_empty(&self) -> bool {
        [&self.first_name, &self.last_name, &self.email]
            .iter()
            .all(|f| f.as_deref().map(str::trim).unwrap_or("").is_empty())
    }
}

/// The tables an author's profile can live in
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSource {
    Students,
    Admins,
}

impl ProfileSource {
    pub fn table(&self) -> &'static str {
        match self {
            ProfileSource::Students => "student_profiles",
            ProfileSource::Admins => "admin_profiles",
        }
    }
}

/// Display metadata shown next to a comment or reply
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Author {
    pub display_name: String,
    pub email: String,
    pub avatar_initial: char,
}

impl Author {
    pub fn unknown() -> Author {
        Author {
            display_name: String::from("Unknown User"),
            email: String::new(),
            avatar_initial: 'U',
        }
    }

    /// Returns `None` for an empty profile
    pub fn from_profile(p: &Profile) -> Option<Author> {
        if p.is_empty() {
            return None;
        }
        let name = [&p.first_name, &p.last_name]
            .iter()
            .filter_map(|n| n.as_deref().map(str::trim))
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let email = p.email.as_deref().unwrap_or("").trim().to_string();
        let avatar_initial = initial_of(&name)
            .or_else(|| initial_of(&email))
            .unwrap_or('U');
        let display_name = match name.is_empty() {
            true => email.clone(),
            false => name,
        };
        Some(Author {
            display_name,
            email,
            avatar_initial,
        })
    }
}

fn initial_of(s: &str) -> Option<char> {
    s.chars()
        .find(|c| c.is_alphanumeric())
        .and_then(|c| c.to_uppercase().next())
}
