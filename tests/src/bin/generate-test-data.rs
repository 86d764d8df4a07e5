//! Prints a JSON array of comments for one post, shaped like the answer of `get-comments`

use chrono::{Duration, Utc};
use hustings_api::{Author, Comment, CommentId, PostId, Profile, Reply, ReplyId, UserId, UserType};
use rand::{seq::SliceRandom, Rng};

const NUM_USERS: usize = 8;
const NUM_COMMENTS: usize = 40;
const MAX_REPLIES: usize = 6;
const COMMENT_WORD_COUNT: usize = 25;
const REPLY_WORD_COUNT: usize = 10;

struct User {
    id: UserId,
    user_type: UserType,
    author: Author,
}

fn gen_user(rng: &mut impl Rng, i: usize) -> User {
    let first = lipsum::lipsum_words(1);
    let last = lipsum::lipsum_words(1);
    let profile = Profile {
        first_name: Some(first.trim_end_matches('.').to_string()),
        last_name: Some(last.trim_end_matches('.').to_string()),
        email: Some(format!("user{i}@uni.edu")),
    };
    User {
        id: UserId(uuid::Uuid::new_v4()),
        // roughly one admin every five users
        user_type: match rng.gen_ratio(1, 5) {
            true => UserType::Admin,
            false => UserType::Student,
        },
        author: Author::from_profile(&profile).unwrap_or_else(Author::unknown),
    }
}

fn main() {
    let post = std::env::args().nth(1).unwrap_or_else(|| String::from("p-1"));
    let post = PostId::from(post.as_str());
    let mut rng = rand::thread_rng();
    let users = (0..NUM_USERS)
        .map(|i| gen_user(&mut rng, i))
        .collect::<Vec<_>>();

    let mut t = Utc::now() - Duration::days(7);
    let mut next_reply = 0;
    let mut comments = Vec::with_capacity(NUM_COMMENTS);
    for i in 0..NUM_COMMENTS {
        t = t + Duration::minutes(rng.gen_range(1..120));
        let user = users.choose(&mut rng).unwrap();
        let id = CommentId(format!("c-{}", 100 + i));
        let edited = rng.gen_ratio(1, 6);

        let mut rt = t;
        let replies = (0..rng.gen_range(0..=MAX_REPLIES))
            .map(|_| {
                rt = rt + Duration::minutes(rng.gen_range(1..30));
                next_reply += 1;
                let who = users.choose(&mut rng).unwrap();
                Reply {
                    id: ReplyId(format!("r-{}", 1000 + next_reply)),
                    comment_id: id.clone(),
                    content: lipsum::lipsum_words(REPLY_WORD_COUNT),
                    created_at: rt,
                    updated_at: rt,
                    user_id: who.id,
                    user_type: who.user_type,
                    author: who.author.clone(),
                }
            })
            .collect::<Vec<_>>();

        comments.push(Comment {
            id,
            post_id: post.clone(),
            content: lipsum::lipsum_words(COMMENT_WORD_COUNT),
            created_at: t,
            updated_at: match edited {
                true => t + Duration::minutes(5),
                false => t,
            },
            user_id: user.id,
            user_type: user.user_type,
            author: user.author.clone(),
            reply_count: replies.len(),
            replies,
        });
    }

    // the server answers newest first
    comments.reverse();
    println!(
        "{}",
        serde_json::to_string_pretty(&comments).expect("serializing generated comments")
    );
}
