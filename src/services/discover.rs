use crate::models::{Conversation, User};

/// Users the requester can still start a conversation with: everyone
/// except the requester and anyone already sharing a conversation with
/// them. Output keeps the order of `all_users`; the linear scan per
/// element is fine at this scale.
pub fn discoverable_users(
    requester_id: &str,
    all_users: Vec<User>,
    conversations: &[Conversation],
) -> Vec<User> {
    let mut known: Vec<&str> = Vec::new();
    for conversation in conversations {
        for participant in &conversation.participants {
            if participant != requester_id && !known.contains(&participant.as_str()) {
                known.push(participant);
            }
        }
    }

    all_users
        .into_iter()
        .filter(|user| user.id != requester_id && !known.contains(&user.id.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: format!("user {}", id),
            email: format!("{}@example.com", id),
            password: "hash".to_string(),
            avatar: "https://example.com/default.png".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn conversation(id: &str, participants: &[&str]) -> Conversation {
        Conversation {
            id: id.to_string(),
            participants: participants.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn ids(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.id.as_str()).collect()
    }

    #[test]
    fn excludes_requester_and_co_participants() {
        let users = vec![user("a"), user("b"), user("c"), user("d")];
        let conversations = vec![conversation("c1", &["a", "b"]), conversation("c2", &["a", "c"])];

        let result = discoverable_users("a", users, &conversations);
        assert_eq!(ids(&result), vec!["d"]);
    }

    #[test]
    fn no_conversations_returns_everyone_else() {
        let users = vec![user("a"), user("b"), user("c")];

        let result = discoverable_users("a", users, &[]);
        assert_eq!(ids(&result), vec!["b", "c"]);
    }

    #[test]
    fn sharing_with_everyone_returns_empty() {
        let users = vec![user("a"), user("b"), user("c")];
        let conversations = vec![conversation("c1", &["a", "b", "c"])];

        let result = discoverable_users("a", users, &conversations);
        assert!(result.is_empty());
    }

    #[test]
    fn conversations_not_involving_requester_do_not_hide_users() {
        // The caller only passes conversations the requester is in, but a
        // group chat can still name co-participants the requester knows.
        let users = vec![user("a"), user("b"), user("c")];
        let conversations = vec![conversation("c1", &["a", "b"])];

        let result = discoverable_users("a", users, &conversations);
        assert_eq!(ids(&result), vec!["c"]);
    }

    #[test]
    fn id_comparison_is_exact() {
        let users = vec![user("1"), user("01")];
        let conversations = vec![conversation("c1", &["1", "01"])];

        let result = discoverable_users("1", users, &conversations);
        assert!(result.is_empty());

        let users = vec![user("1"), user("01")];
        let result = discoverable_users("1", users, &[]);
        assert_eq!(ids(&result), vec!["01"]);
    }
}
