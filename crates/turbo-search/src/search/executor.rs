//! Paginated search execution.

use std::collections::{BTreeSet, HashMap};

use edge_data::{DependencyTag, FetchError, StoreClient};
use turbo_db::{FindOptions, Predicate, SortSpec, Value};

use crate::catalog::{category_fields, Category, Product, CATEGORIES, PRODUCTS};
use crate::ids::CategoryId;
use crate::search::results::{page_offset, Pagination, ProductHit};

/// One executed page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedSearch {
    pub hits: Vec<ProductHit>,
    pub pagination: Pagination,
}

/// Runs the page fetch and the total count against one predicate.
pub struct SearchExecutor<'a> {
    client: &'a StoreClient,
}

impl<'a> SearchExecutor<'a> {
    pub fn new(client: &'a StoreClient) -> Self {
        Self { client }
    }

    /// Fetch one page and the total count concurrently, then join categories.
    ///
    /// Count and page are independent reads, so under concurrent catalog
    /// edits the total may briefly disagree with the page.
    pub async fn execute(
        &self,
        predicate: &Predicate,
        sort: &SortSpec,
        page: u64,
        limit: u64,
    ) -> Result<ExecutedSearch, FetchError> {
        let options = FindOptions::new()
            .sort(sort.clone())
            .skip(page_offset(page, limit))
            .limit(limit);

        let count_future = self.client.count(DependencyTag::Search, PRODUCTS, predicate);
        let page_future =
            self.client
                .find::<Product>(DependencyTag::Search, PRODUCTS, predicate, &options);
        let (total, products) = futures::join!(count_future, page_future);
        let (total, products) = (total?, products?);

        Ok(ExecutedSearch {
            hits: self.join_categories(products).await?,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// Attach category name and image to each product with one follow-up read.
    pub async fn join_categories(&self, products: Vec<Product>) -> Result<Vec<ProductHit>, FetchError> {
        let ids: BTreeSet<&CategoryId> = products.iter().filter_map(|p| p.category.as_ref()).collect();
        let categories: HashMap<CategoryId, Category> = if ids.is_empty() {
            HashMap::new()
        } else {
            let wanted = ids.iter().map(|id| Value::from(id.as_str())).collect();
            self.client
                .find::<Category>(
                    DependencyTag::Categories,
                    CATEGORIES,
                    &Predicate::is_in(category_fields::ID, wanted),
                    &FindOptions::new(),
                )
                .await?
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect()
        };

        Ok(products
            .into_iter()
            .map(|mut product| {
                let category = product.category.as_ref().and_then(|id| categories.get(id));
                product.category_name = category.map(|c| c.name.clone()).unwrap_or_default();
                ProductHit {
                    category_image: category.and_then(|c| c.image.clone()),
                    product,
                }
            })
            .collect())
    }
}
