//! The static list of newspaper sections we harvest.
//!
//! | Newspaper | Sections |
//! |-----------|----------|
//! | Berita Harian | Nasional, Politik, Kes |
//! | New Straits Times | Nation, Politics, Crime & Courts, Exclusive, Government |
//! | Utusan | Terkini, Utama, Nasional, Politik, Jenayah |

use crate::models::{Newspaper, Source};

struct Section {
    newspaper: Newspaper,
    category: &'static str,
    subcategory: &'static str,
    url: &'static str,
    tags: &'static [&'static str],
}

const SECTIONS: &[Section] = &[
    Section {
        newspaper: Newspaper::Bharian,
        category: "Berita",
        subcategory: "Nasional",
        url: "https://www.bharian.com.my/berita/nasional",
        tags: &["news", "nation"],
    },
    Section {
        newspaper: Newspaper::Bharian,
        category: "Berita",
        subcategory: "Politik",
        url: "https://www.bharian.com.my/berita/politik",
        tags: &["news", "politics"],
    },
    Section {
        newspaper: Newspaper::Bharian,
        category: "Berita",
        subcategory: "Kes",
        url: "https://www.bharian.com.my/berita/kes",
        tags: &["news", "crime"],
    },
    Section {
        newspaper: Newspaper::Nst,
        category: "News",
        subcategory: "Nation",
        url: "https://www.nst.com.my/news/nation",
        tags: &["news", "nation"],
    },
    Section {
        newspaper: Newspaper::Nst,
        category: "News",
        subcategory: "Politics",
        url: "https://www.nst.com.my/news/politics",
        tags: &["news", "politics"],
    },
    Section {
        newspaper: Newspaper::Nst,
        category: "News",
        subcategory: "Crime & Courts",
        url: "https://www.nst.com.my/news/crime-courts",
        tags: &["news", "crime"],
    },
    Section {
        newspaper: Newspaper::Nst,
        category: "News",
        subcategory: "Exclusive",
        url: "https://www.nst.com.my/news/exclusive",
        tags: &["news", "exclusive"],
    },
    Section {
        newspaper: Newspaper::Nst,
        category: "News",
        subcategory: "Government",
        url: "https://www.nst.com.my/news/government-public-policy",
        tags: &["news", "government"],
    },
    Section {
        newspaper: Newspaper::Utusan,
        category: "Berita",
        subcategory: "Terkini",
        url: "http://www.utusan.com.my/berita/terkini",
        tags: &["news", "latest"],
    },
    Section {
        newspaper: Newspaper::Utusan,
        category: "Berita",
        subcategory: "Utama",
        url: "http://www.utusan.com.my/berita/utama",
        tags: &["news", "main"],
    },
    Section {
        newspaper: Newspaper::Utusan,
        category: "Berita",
        subcategory: "Nasional",
        url: "http://www.utusan.com.my/berita/nasional",
        tags: &["news", "nation"],
    },
    Section {
        newspaper: Newspaper::Utusan,
        category: "Berita",
        subcategory: "Politik",
        url: "http://www.utusan.com.my/berita/politik",
        tags: &["news", "politics"],
    },
    Section {
        newspaper: Newspaper::Utusan,
        category: "Berita",
        subcategory: "Jenayah",
        url: "http://www.utusan.com.my/berita/jenayah",
        tags: &["news", "crime"],
    },
];

/// All sources in catalog order.
pub fn sources() -> Vec<Source> {
    SECTIONS
        .iter()
        .map(|s| Source::new(s.newspaper, s.category, s.subcategory, s.url, s.tags))
        .collect()
}
