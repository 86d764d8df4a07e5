use async_trait::async_trait;

use crate::api::{
    Backend, Comment, CommentList, CreatedComment, CreatedReply, DeleteComment, DeleteReply,
    EditComment, EditReply, Error, NewComment, NewReply, PostId, Profile, ProfileAnswer,
    ProfileQuery, ProfileSource, Reply, UserId,
};

/// The hosted backend, reached over its REST API
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    host: String,
    token: Option<String>,
}

fn network(err: reqwest::Error) -> Error {
    Error::Network(err.to_string())
}

fn decode(err: reqwest::Error) -> Error {
    Error::Unknown(format!("invalid answer from server: {err}"))
}

impl HttpBackend {
    pub fn new(host: String, token: Option<String>) -> HttpBackend {
        HttpBackend {
            client: reqwest::Client::new(),
            host: String::from(host.trim_end_matches('/')),
            token,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn route(&self, route: &str) -> String {
        format!("{}/api/{}", self.host, route)
    }

    async fn call(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        let req = match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        };
        let resp = req.send().await.map_err(network)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.bytes().await.map_err(network)?;
        Err(Error::parse(&body).unwrap_or_else(|err| {
            tracing::warn!(%status, ?err, "unparseable error answer");
            Error::Unknown(format!("server answered {status}"))
        }))
    }

    async fn post<T: serde::Serialize + ?Sized>(
        &self,
        route: &str,
        body: &T,
    ) -> Result<reqwest::Response, Error> {
        self.call(self.client.post(self.route(route)).json(body))
            .await
    }
}

#[async_trait(?Send)]
impl Backend for HttpBackend {
    async fn fetch_comments(&self, post: &PostId) -> Result<Vec<Comment>, Error> {
        let req = self
            .client
            .get(self.route("get-comments"))
            .query(&[("post_id", &post.0)]);
        let list = self
            .call(req)
            .await?
            .json::<CommentList>()
            .await
            .map_err(decode)?;
        Ok(list.comments)
    }

    async fn add_comment(&self, c: &NewComment) -> Result<Comment, Error> {
        let created = self
            .post("add-comment", c)
            .await?
            .json::<CreatedComment>()
            .await
            .map_err(decode)?;
        Ok(created.comment)
    }

    async fn add_reply(&self, r: &NewReply) -> Result<Option<Reply>, Error> {
        let body = self
            .post("add-reply", r)
            .await?
            .bytes()
            .await
            .map_err(network)?;
        if body.is_empty() {
            return Ok(None);
        }
        match serde_json::from_slice::<CreatedReply>(&body) {
            Ok(created) => Ok(created.reply),
            Err(err) => {
                tracing::debug!(?err, "add-reply answered without a usable reply");
                Ok(None)
            }
        }
    }

    async fn edit_comment(&self, e: &EditComment) -> Result<(), Error> {
        self.post("edit-comment", e).await?;
        Ok(())
    }

    async fn edit_reply(&self, e: &EditReply) -> Result<(), Error> {
        self.post("edit-reply", e).await?;
        Ok(())
    }

    async fn delete_comment(&self, d: &DeleteComment) -> Result<(), Error> {
        self.post("delete-comment", d).await?;
        Ok(())
    }

    async fn delete_reply(&self, d: &DeleteReply) -> Result<(), Error> {
        self.post("delete-reply", d).await?;
        Ok(())
    }

    async fn fetch_profile(
        &self,
        source: ProfileSource,
        user_id: UserId,
    ) -> Result<Option<Profile>, Error> {
        let answer = self
            .post("get-profile", &ProfileQuery { source, user_id })
            .await?
            .json::<ProfileAnswer>()
            .await
            .map_err(decode)?;
        Ok(answer.profile)
    }
}
