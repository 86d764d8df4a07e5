use async_trait::async_trait;

use crate::api::{Author, Backend, Error, ProfileSource, UserId, UserType};

/// The signed-in user, as needed to author comments
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Identity {
    pub user_id: UserId,
    pub user_type: UserType,
    pub author: Author,
}

/// One place an author's display metadata may be found
#[async_trait(?Send)]
pub trait AuthorResolver {
    /// `Ok(None)` means this resolver does not know the user
    async fn resolve(&self, user: UserId) -> Result<Option<Author>, Error>;
}

/// Looks the user up in one profile table
pub struct ProfileTable<'a, B: ?Sized> {
    backend: &'a B,
    source: ProfileSource,
}

impl<'a, B: ?Sized> ProfileTable<'a, B> {
    pub fn new(backend: &'a B, source: ProfileSource) -> Self {
        ProfileTable { backend, source }
    }
}

#[async_trait(?Send)]
impl<'a, B: ?Sized + Backend> AuthorResolver for ProfileTable<'a, B> {
    async fn resolve(&self, user: UserId) -> Result<Option<Author>, Error> {
        Ok(self
            .backend
            .fetch_profile(self.source, user)
            .await?
            .as_ref()
            .and_then(Author::from_profile))
    }
}

/// Tries each resolver in order, first match wins.
///
/// Lookup failures count as misses; when nobody knows the user, `Author::unknown()`.
pub async fn resolve_author(resolvers: &[&dyn AuthorResolver], user: UserId) -> Author {
    for r in resolvers {
        match r.resolve(user).await {
            Ok(Some(author)) => return author,
            Ok(None) => (),
            Err(err) => tracing::warn!(?user, ?err, "author lookup failed"),
        }
    }
    tracing::debug!(?user, "no profile found for author");
    Author::unknown()
}

/// Student profiles first, then admin profiles
pub async fn resolve_from_profiles<B: ?Sized + Backend>(backend: &B, user: UserId) -> Author {
    let students = ProfileTable::new(backend, ProfileSource::Students);
    let admins = ProfileTable::new(backend, ProfileSource::Admins);
    resolve_author(&[&students, &admins], user).await
}
