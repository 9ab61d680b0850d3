use ispstore::models::{
    Connection, Customer, CustomerBundle, CustomerContacts, Node, Plan,
};
use serde::{Deserialize, Deserializer};

/// Listing endpoints answer either a bare array or `{"data": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Wrapped { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Wrapped { data } => data,
            Listing::Bare(items) => items,
        }
    }
}

/// Node row as the CRM ships it; the display name travels in `comment`.
#[derive(Debug, Deserialize)]
pub struct RawNode {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub comment: Option<String>,
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "optional_u16")]
    pub api_port: Option<u16>,
}

impl RawNode {
    pub fn into_node(self) -> Node {
        Node {
            name: self.comment.unwrap_or_else(|| format!("node {}", self.id)),
            node_id: self.id,
            ip_address: self.ip,
            api_port: self.api_port,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawPlan {
    #[serde(deserialize_with = "id_i64")]
    pub id: i64,
    pub name: Option<String>,
    pub speed: Option<String>,
    pub comment: Option<String>,
}

impl RawPlan {
    pub fn into_plan(self) -> Plan {
        Plan {
            name: self.name.unwrap_or_else(|| format!("plan {}", self.id)),
            plan_id: self.id,
            speed: self.speed,
            description: self.comment,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawConnection {
    #[serde(deserialize_with = "id_i64")]
    pub id: i64,
    pub user: Option<String>,
    #[serde(default, deserialize_with = "optional_id_i64")]
    pub customer_id: Option<i64>,
    #[serde(default, deserialize_with = "optional_id_string")]
    pub node_id: Option<String>,
    #[serde(default, deserialize_with = "optional_id_i64")]
    pub plan_id: Option<i64>,
    pub conntype: Option<String>,
    pub address: Option<String>,
}

impl RawConnection {
    pub fn is_pppoe(&self) -> bool {
        self.conntype.as_deref() == Some("pppoe")
    }

    /// `None` when the row carries no PPPoE username to join on.
    pub fn into_connection(self) -> Option<Connection> {
        let username = self.user?;
        Some(Connection {
            connection_id: self.id,
            pppoe_username: username,
            customer_id: self.customer_id,
            node_id: self.node_id,
            plan_id: self.plan_id,
            address: self.address,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RawContact {
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawCustomer {
    #[serde(deserialize_with = "id_i64")]
    pub id: i64,
    pub name: Option<String>,
    pub doc_number: Option<String>,
    pub status: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub emails: Vec<RawContact>,
    #[serde(default)]
    pub phones: Vec<RawContact>,
}

impl RawCustomer {
    pub fn into_bundle(self) -> CustomerBundle {
        let contacts = CustomerContacts {
            emails: self.emails.into_iter().filter_map(|c| c.value).collect(),
            phones: self.phones.into_iter().filter_map(|c| c.value).collect(),
        };
        CustomerBundle {
            customer: Customer {
                name: self.name.unwrap_or_else(|| format!("customer {}", self.id)),
                customer_id: self.id,
                doc_number: self.doc_number,
                billing_status: self.status,
                address: self.address,
            },
            contacts,
        }
    }
}

// The CRM is inconsistent about whether ids are numbers or strings, so the
// deserializers below accept both.

fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn id_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom("id is not an integer")),
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("cannot parse '{s}' as id"))),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn optional_id_i64<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => Ok(n.as_i64()),
        serde_json::Value::String(s) if s.is_empty() => Ok(None),
        serde_json::Value::String(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("cannot parse '{s}' as id"))),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn optional_id_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) if s.is_empty() => Ok(None),
        serde_json::Value::String(s) => Ok(Some(s)),
        serde_json::Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn optional_u16<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => Ok(n.as_u64().and_then(|v| u16::try_from(v).ok())),
        serde_json::Value::String(s) if s.is_empty() => Ok(None),
        serde_json::Value::String(s) => Ok(s.parse::<u16>().ok()),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_accepts_both_shapes() {
        let wrapped: Listing<RawNode> =
            serde_json::from_str(r#"{"data": [{"id": 1, "comment": "pop", "ip": "10.0.0.1"}]}"#)
                .unwrap();
        assert_eq!(wrapped.into_items().len(), 1);

        let bare: Listing<RawNode> =
            serde_json::from_str(r#"[{"id": "n1", "comment": null, "ip": null}]"#).unwrap();
        assert_eq!(bare.into_items().len(), 1);
    }

    #[test]
    fn numeric_and_string_ids_both_map() {
        let node: RawNode = serde_json::from_str(r#"{"id": 42, "comment": "pop", "ip": "10.0.0.1"}"#).unwrap();
        assert_eq!(node.into_node().node_id, "42");

        let plan: RawPlan = serde_json::from_str(r#"{"id": "7", "name": "Fiber"}"#).unwrap();
        assert_eq!(plan.into_plan().plan_id, 7);
    }

    #[test]
    fn non_pppoe_connection_is_filtered() {
        let conn: RawConnection = serde_json::from_str(
            r#"{"id": 1, "user": "alice", "conntype": "static", "customer_id": 2}"#,
        )
        .unwrap();
        assert!(!conn.is_pppoe());
    }

    #[test]
    fn customer_contacts_are_flattened() {
        let raw: RawCustomer = serde_json::from_str(
            r#"{"id": 1, "name": "Alice", "emails": [{"value": "a@b.c"}, {"value": null}], "phones": []}"#,
        )
        .unwrap();
        let bundle = raw.into_bundle();
        assert_eq!(bundle.contacts.emails, vec!["a@b.c".to_string()]);
        assert!(bundle.contacts.phones.is_empty());
    }
}
