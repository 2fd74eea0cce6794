mod parsed_url;

pub use self::parsed_url::ParsedUrl;
