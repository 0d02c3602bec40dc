//! SOQL query definition

use super::filters::Filter;

/// A SELECT over a single sObject with AND-joined filters
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// sObject API name (e.g. "Shopper_Inspection__c")
    pub object: String,
    /// Selected field API names
    pub fields: Vec<String>,
    pub filters: Vec<Filter>,
}

impl Query {
    /// Start a query against an sObject
    pub fn new(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            fields: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Add fields to the SELECT list
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Add a condition
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Render the SOQL statement. Selects `Id` when no fields were given.
    pub fn to_soql(&self) -> String {
        let fields = if self.fields.is_empty() {
            "Id".to_string()
        } else {
            self.fields.join(", ")
        };

        let mut soql = format!("SELECT {} FROM {}", fields, self.object);

        if !self.filters.is_empty() {
            let conditions: Vec<String> = self.filters.iter().map(Filter::to_soql).collect();
            soql.push_str(" WHERE ");
            soql.push_str(&conditions.join(" AND "));
        }

        soql
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_soql())
    }
}
