//! Static reference table of catalog departments ("search indexes").
//!
//! Keyed by the category token sent as `SearchIndex`. The table is built
//! once on first use and never mutated.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Catch-all category token.
pub const ALL: &str = "All";

/// Descriptor for one catalog department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIndex {
    pub department: &'static str,
    pub root_browse_node: u64,
    pub sort_values: &'static [&'static str],
    pub default_sort: Option<&'static str>,
    pub parameters: &'static [&'static str],
}

impl SearchIndex {
    /// Whether the remote API accepts `parameter` for this department.
    pub fn accepts(&self, parameter: &str) -> bool {
        self.parameters.contains(&parameter)
    }

    pub fn allows_sort(&self, sort: &str) -> bool {
        self.sort_values.contains(&sort)
    }
}

static SEARCH_INDEXES: LazyLock<HashMap<&'static str, SearchIndex>> = LazyLock::new(|| {
    HashMap::from([
        (
            ALL,
            SearchIndex {
                department: "All Departments",
                root_browse_node: 0,
                sort_values: &[],
                default_sort: None,
                parameters: &[
                    "Availability",
                    "ItemPage",
                    "Keywords",
                    "MaximumPrice",
                    "MerchantId",
                    "MinPercentageOff",
                    "MinimumPrice",
                ],
            },
        ),
        (
            "Appliances",
            SearchIndex {
                department: "Appliances",
                root_browse_node: 2619526011,
                sort_values: &[
                    "salesrank",
                    "pmrank",
                    "price",
                    "-price",
                    "relevancerank",
                    "reviewrank",
                    "reviewrank_authority",
                ],
                default_sort: Some("salesrank"),
                parameters: BRANDED_PARAMETERS,
            },
        ),
        (
            "ArtsAndCrafts",
            SearchIndex {
                department: "Arts, Crafts & Sewing",
                root_browse_node: 2617942011,
                sort_values: &[
                    "salesrank",
                    "pmrank",
                    "reviewrank",
                    "reviewrank_authority",
                    "relevancerank",
                    "price",
                    "-price",
                ],
                default_sort: Some("salesrank"),
                parameters: BRANDED_PARAMETERS,
            },
        ),
        (
            "Automotive",
            SearchIndex {
                department: "Automotive",
                root_browse_node: 15690151,
                sort_values: &[
                    "salesrank",
                    "titlerank",
                    "-titlerank",
                    "relevancerank",
                    "price",
                    "-price",
                ],
                default_sort: Some("salesrank"),
                parameters: BRANDED_PARAMETERS,
            },
        ),
        (
            "Baby",
            SearchIndex {
                department: "Baby",
                root_browse_node: 165797011,
                sort_values: &["salesrank", "psrank", "titlerank", "-price", "price"],
                default_sort: Some("salesrank"),
                parameters: &[
                    "Author",
                    "Availability",
                    "Brand",
                    "ItemPage",
                    "Keywords",
                    "Manufacturer",
                    "MaximumPrice",
                    "MerchantId",
                    "MinPercentageOff",
                    "MinimumPrice",
                    "Sort",
                    "Title",
                ],
            },
        ),
        (
            "Books",
            SearchIndex {
                department: "Books",
                root_browse_node: 1000,
                sort_values: &[
                    "relevancerank",
                    "salesrank",
                    "reviewrank",
                    "pricerank",
                    "inverse-pricerank",
                    "daterank",
                    "titlerank",
                    "-titlerank",
                    "-unit-sales",
                    "price",
                    "-price",
                    "-publication_date",
                ],
                default_sort: Some("salesrank"),
                parameters: &[
                    "Author",
                    "Availability",
                    "ItemPage",
                    "Keywords",
                    "MaximumPrice",
                    "MerchantId",
                    "MinPercentageOff",
                    "MinimumPrice",
                    "Power",
                    "Publisher",
                    "Sort",
                    "Title",
                ],
            },
        ),
        (
            "Electronics",
            SearchIndex {
                department: "Electronics",
                root_browse_node: 493964,
                sort_values: &[
                    "salesrank",
                    "pmrank",
                    "titlerank",
                    "-titlerank",
                    "reviewrank",
                    "reviewrank_authority",
                    "relevancerank",
                    "price",
                    "-price",
                ],
                default_sort: Some("salesrank"),
                parameters: BRANDED_PARAMETERS,
            },
        ),
    ])
});

const BRANDED_PARAMETERS: &[&str] = &[
    "Availability",
    "Brand",
    "ItemPage",
    "Keywords",
    "Manufacturer",
    "MaximumPrice",
    "MerchantId",
    "MinPercentageOff",
    "MinimumPrice",
    "Sort",
    "Title",
];

/// Look up the descriptor for `category`. Tokens are case-sensitive.
pub fn lookup(category: &str) -> Option<&'static SearchIndex> {
    SEARCH_INDEXES.get(category)
}

/// All known category tokens, sorted.
pub fn categories() -> Vec<&'static str> {
    let mut keys: Vec<_> = SEARCH_INDEXES.keys().copied().collect();
    keys.sort_unstable();
    keys
}
