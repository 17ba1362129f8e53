/// Filters for the admin user list. Unset fields are left out of the query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl UserListQuery {
    /// URL query string without the leading `?`; empty when no filter is set.
    pub fn to_query(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query.append_pair("search", search);
        }
        if let Some(limit) = self.limit {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(offset) = self.offset {
            query.append_pair("offset", &offset.to_string());
        }
        query.finish()
    }
}
