//! In-memory product catalog and its XML rendering.

pub const NAMESPACE: &str = "http://webservices.amazon.com/AWSECommerceService/2013-08-01";

/// One product known to the mock catalog. Listed in sales-rank order.
#[derive(Debug, Clone)]
pub struct Product {
    pub asin: &'static str,
    pub title: &'static str,
    pub search_index: &'static str,
    pub binding: Option<&'static str>,
    pub manufacturer: Option<&'static str>,
    pub list_price: i64,
    pub lowest_new_price: Option<i64>,
    /// `AvailabilityType` of the offer listing; `None` means no listing.
    pub availability: Option<&'static str>,
    pub prime: bool,
    pub sold_by_amazon: bool,
    pub adult: bool,
    pub description: Option<&'static str>,
    pub features: &'static [&'static str],
}

pub static PRODUCTS: &[Product] = &[
    Product {
        asin: "B00KETTLE1",
        title: "Electric Kettle 1.7L",
        search_index: "Appliances",
        binding: Some("Kitchen"),
        manufacturer: Some("Acme"),
        list_price: 3499,
        lowest_new_price: Some(2999),
        availability: Some("now"),
        prime: true,
        sold_by_amazon: true,
        adult: false,
        description: Some("<p>Boils water <b>fast</b>.</p>"),
        features: &["1.7 L capacity", "Auto shut-off"],
    },
    Product {
        asin: "B00TOASTER",
        title: "Four Slice Toaster",
        search_index: "Appliances",
        binding: Some("Kitchen"),
        manufacturer: Some("Toastmaster"),
        list_price: 5999,
        lowest_new_price: Some(4950),
        availability: Some("now"),
        prime: false,
        sold_by_amazon: false,
        adult: false,
        description: None,
        features: &["Four extra-wide slots"],
    },
    Product {
        asin: "B00RUSTBK1",
        title: "The Rust Programming Language",
        search_index: "Books",
        binding: Some("Paperback"),
        manufacturer: Some("No Starch Press"),
        list_price: 3995,
        lowest_new_price: Some(2799),
        availability: Some("now"),
        prime: true,
        sold_by_amazon: true,
        adult: false,
        description: Some("The official book on Rust."),
        features: &[],
    },
    Product {
        asin: "B00CHARGER",
        title: "USB-C Wall Charger",
        search_index: "Electronics",
        binding: Some("Electronics"),
        manufacturer: Some("Voltly"),
        list_price: 2599,
        lowest_new_price: Some(1999),
        availability: Some("now"),
        prime: true,
        sold_by_amazon: true,
        adult: false,
        description: None,
        features: &["65 W output", "Foldable plug"],
    },
    Product {
        asin: "B00CRAYONS",
        title: "Washable Crayons, 24 Count",
        search_index: "ArtsAndCrafts",
        binding: Some("Toy"),
        manufacturer: Some("Colorworks"),
        list_price: 799,
        lowest_new_price: Some(549),
        availability: Some("futureDate"),
        prime: false,
        sold_by_amazon: true,
        adult: false,
        description: None,
        features: &[],
    },
    Product {
        asin: "B00WIPER01",
        title: "All-Season Wiper Blades",
        search_index: "Automotive",
        binding: None,
        manufacturer: None,
        list_price: 1999,
        lowest_new_price: None,
        availability: None,
        prime: false,
        sold_by_amazon: false,
        adult: false,
        description: None,
        features: &[],
    },
];

pub fn find(asin: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.asin == asin)
}

impl Product {
    /// Whether every whitespace-separated word of `keywords` appears in the
    /// title or a feature, ignoring case.
    pub fn matches(&self, keywords: &str) -> bool {
        let haystack = std::iter::once(self.title)
            .chain(self.features.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        keywords
            .split_whitespace()
            .all(|word| haystack.contains(&word.to_lowercase()))
    }

    pub fn price_for_sort(&self) -> i64 {
        self.lowest_new_price.unwrap_or(self.list_price)
    }

    /// Render as an `<Item>` element. With `amazon_only`, offers from other
    /// merchants are left out.
    pub fn to_xml(&self, amazon_only: bool) -> String {
        let asin = self.asin;
        let mut xml = format!(
            "<Item><ASIN>{asin}</ASIN><DetailPageURL>https://www.amazon.com/dp/{asin}</DetailPageURL>"
        );
        for (size, px) in [("Small", 75), ("Medium", 160), ("Large", 500)] {
            xml.push_str(&format!(
                "<{size}Image><URL>https://images.example.com/{asin}._SL{px}_.jpg</URL></{size}Image>"
            ));
        }

        xml.push_str("<ItemAttributes>");
        if let Some(binding) = self.binding {
            xml.push_str(&format!("<Binding>{}</Binding>", escape(binding)));
        }
        for feature in self.features {
            xml.push_str(&format!("<Feature>{}</Feature>", escape(feature)));
        }
        xml.push_str(&format!("<IsAdultProduct>{}</IsAdultProduct>", u8::from(self.adult)));
        xml.push_str(&format!(
            "<ListPrice><Amount>{}</Amount><CurrencyCode>USD</CurrencyCode></ListPrice>",
            self.list_price
        ));
        if let Some(manufacturer) = self.manufacturer {
            xml.push_str(&format!("<Manufacturer>{}</Manufacturer>", escape(manufacturer)));
        }
        xml.push_str(&format!("<Title>{}</Title></ItemAttributes>", escape(self.title)));

        if let Some(lowest) = self.lowest_new_price {
            xml.push_str(&format!(
                "<OfferSummary><LowestNewPrice><Amount>{lowest}</Amount><CurrencyCode>USD</CurrencyCode></LowestNewPrice></OfferSummary>"
            ));
        }

        xml.push_str("<Offers>");
        match self.availability {
            Some(kind) if self.sold_by_amazon || !amazon_only => {
                xml.push_str(&format!(
                    "<Offer><OfferListing><AvailabilityAttributes><AvailabilityType>{kind}</AvailabilityType></AvailabilityAttributes><IsEligibleForPrime>{}</IsEligibleForPrime></OfferListing></Offer>",
                    u8::from(self.prime)
                ));
            }
            _ => {}
        }
        xml.push_str("</Offers>");

        if let Some(description) = self.description {
            xml.push_str(&format!(
                "<EditorialReviews><EditorialReview><Source>Product Description</Source><Content>{}</Content></EditorialReview></EditorialReviews>",
                escape(description)
            ));
        }
        xml.push_str("</Item>");
        xml
    }
}

pub fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
