use serde::{Deserialize, Serialize};

/// Top-level envelope returned by `/r/{source}/new/.json`.
#[derive(Debug, Deserialize, Serialize)]
pub struct ListingResponse {
    pub data: ListingData,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ListingData {
    pub children: Vec<ListingChild>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ListingChild {
    pub data: Post,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub is_self: bool,
}

/// One fetched page: its items in API order plus the token for the next page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub items: Vec<Post>,
    pub after: Option<String>,
}

impl ListingPage {
    /// The continuation token, with an empty string treated as absent.
    pub fn next_token(&self) -> Option<&str> {
        self.after.as_deref().filter(|token| !token.is_empty())
    }
}

impl From<ListingResponse> for ListingPage {
    fn from(response: ListingResponse) -> Self {
        Self {
            items: response
                .data
                .children
                .into_iter()
                .map(|child| child.data)
                .collect(),
            after: response.data.after,
        }
    }
}
