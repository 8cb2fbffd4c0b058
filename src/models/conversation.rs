#[derive(Debug, Clone)]
pub struct Conversation {
    pub id: String,
    pub participants: Vec<String>,
}
