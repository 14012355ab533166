pub mod quote_provider;
pub mod finnhub;
pub mod news;

pub use quote_provider::{ CompanyProfile, Quote, QuoteProvider };
pub use finnhub::FinnhubProvider;
pub use news::NewsClient;
