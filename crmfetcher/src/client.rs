use crate::error::Result;
use crate::models::{Listing, RawConnection, RawCustomer, RawNode, RawPlan};
use crate::paginate::fetch_all_pages;
use crate::session::{AuthSession, Credentials};
use async_trait::async_trait;
use ispstore::models::{Connection, CustomerBundle, Node, Plan};
use ispstore::sync::{AdminSource, Pull, SourceResult};
use reqwest::{Client, Method};
use std::time::Duration;

const DEFAULT_PAGE_SIZE: usize = 200;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the administrative (billing/CRM) API.
pub struct AdminClient {
    session: AuthSession,
    page_size: usize,
}

impl AdminClient {
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            session: AuthSession::new(http, base_url, credentials)?,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub async fn nodes_list(&self) -> Result<Vec<Node>> {
        let response = self
            .session
            .execute(Method::GET, "nodes/nodes_list", &[])
            .await?;
        let listing: Listing<RawNode> = response.json().await?;
        Ok(listing
            .into_items()
            .into_iter()
            .map(RawNode::into_node)
            .collect())
    }

    pub async fn plans_list(&self) -> Result<Vec<Plan>> {
        let response = self
            .session
            .execute(Method::GET, "plans/plans_list", &[])
            .await?;
        let listing: Listing<RawPlan> = response.json().await?;
        Ok(listing
            .into_items()
            .into_iter()
            .map(RawPlan::into_plan)
            .collect())
    }

    /// Full connection list. The upstream endpoint is unpaginated, so large
    /// fleets are walked defensively with `(limit, offset)` anyway; only
    /// PPPoE rows survive the mapping.
    pub async fn connections_list(&self) -> Result<Pull<Connection>> {
        let pull = fetch_all_pages("connections", self.page_size, |limit, offset| async move {
            let response = self
                .session
                .execute(
                    Method::GET,
                    "connections/connections_list",
                    &[
                        ("limit", limit.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;
            let listing: Listing<RawConnection> = response.json().await?;
            Ok(listing.into_items())
        })
        .await?;

        let Pull { records, partial } = pull;
        let connections = records
            .into_iter()
            .filter(RawConnection::is_pppoe)
            .filter_map(RawConnection::into_connection)
            .collect();
        Ok(Pull {
            records: connections,
            partial,
        })
    }

    /// Paginated customer listing; email/phone contact sub-lists arrive
    /// embedded in each customer row.
    pub async fn customers_list(&self) -> Result<Pull<CustomerBundle>> {
        let pull = fetch_all_pages("customers", self.page_size, |limit, offset| async move {
            let response = self
                .session
                .execute(
                    Method::GET,
                    "customers/customers_list",
                    &[
                        ("limit", limit.to_string()),
                        ("offset", offset.to_string()),
                    ],
                )
                .await?;
            let listing: Listing<RawCustomer> = response.json().await?;
            Ok(listing.into_items())
        })
        .await?;

        let Pull { records, partial } = pull;
        Ok(Pull {
            records: records.into_iter().map(RawCustomer::into_bundle).collect(),
            partial,
        })
    }
}

#[async_trait]
impl AdminSource for AdminClient {
    async fn nodes(&self) -> SourceResult<Vec<Node>> {
        Ok(self.nodes_list().await?)
    }

    async fn plans(&self) -> SourceResult<Vec<Plan>> {
        Ok(self.plans_list().await?)
    }

    async fn connections(&self) -> SourceResult<Pull<Connection>> {
        Ok(self.connections_list().await?)
    }

    async fn customers(&self) -> SourceResult<Pull<CustomerBundle>> {
        Ok(self.customers_list().await?)
    }
}
