//! Synthetic SEBI corpus generator
//!
//! Produces realistic-looking regulatory documents for development and
//! testing. Lives in the CLI because fixture generation is a corpus
//! producer, not part of the retrieval core.

use chrono::{Duration, NaiveDate};
use fincomply_rag::{Document, DocumentMetadata};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CATEGORIES: &[&str] = &[
    "Circular",
    "Notification",
    "Guidelines",
    "Press Release",
    "Master Circular",
    "Amendment",
];

const TOPICS: &[&str] = &[
    "Insider Trading Regulations",
    "Mutual Fund Compliance",
    "Stock Exchange Listing Requirements",
    "Corporate Governance Norms",
    "Disclosure Requirements",
    "Alternative Investment Funds",
    "Portfolio Management Services",
    "Credit Rating Agencies",
    "Investment Advisers Registration",
    "Depository Participants Guidelines",
    "Takeover Regulations",
    "Delisting Procedures",
    "Research Analyst Regulations",
    "Foreign Portfolio Investors",
    "Real Estate Investment Trusts (REITs)",
];

const DEPARTMENTS: &[&str] = &["IMD", "MRD", "CFD"];
const DIVISIONS: &[&str] = &["Investment Management", "Market Regulation", "Enforcement"];

/// Generator for a synthetic SEBI document corpus.
///
/// Seeded runs are fully reproducible; dates are anchored to a fixed
/// reference date rather than the wall clock for the same reason.
pub struct SebiCorpusGenerator {
    rng: StdRng,
}

impl SebiCorpusGenerator {
    /// Create a generator, seeded for reproducibility when a seed is given.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.gen_range(0..items.len())]
    }

    fn pick_num(&mut self, items: &[u32]) -> u32 {
        items[self.rng.gen_range(0..items.len())]
    }

    fn recent_date(&mut self) -> NaiveDate {
        let anchor = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid anchor date");
        anchor - Duration::days(self.rng.gen_range(0..730))
    }

    /// Generate `count` documents with ids `SEBI-001` onward.
    pub fn generate(&mut self, count: usize) -> Vec<Document> {
        (1..=count).map(|i| self.generate_document(i)).collect()
    }

    fn generate_document(&mut self, number: usize) -> Document {
        let topic = self.pick(TOPICS).to_string();
        let category = self.pick(CATEGORIES).to_string();
        let published_date = self.recent_date();
        let content = self.document_text(&topic, &category, published_date);
        let word_count = content.split_whitespace().count();

        Document {
            id: format!("SEBI-{number:03}"),
            title: format!("{category} on {topic}"),
            category: category.clone(),
            topic: topic.clone(),
            published_date,
            source_url: format!("https://www.sebi.gov.in/legal/circulars/{number}.html"),
            content,
            document_type: (if self.rng.gen_bool(0.5) { "PDF" } else { "HTML" }).to_string(),
            metadata: DocumentMetadata {
                regulation_number: format!(
                    "SEBI/HO/{}/{}/{}",
                    self.pick(DEPARTMENTS),
                    self.rng.gen_range(1..100),
                    self.rng.gen_range(2020..2026),
                ),
                keywords: vec![
                    topic,
                    category,
                    "compliance".to_string(),
                    "regulations".to_string(),
                ],
                word_count,
            },
        }
    }

    fn document_text(&mut self, topic: &str, category: &str, date: NaiveDate) -> String {
        let mut sections = Vec::new();

        sections.push(format!(
            "SECURITIES AND EXCHANGE BOARD OF INDIA\n\
             {}\n\
             Reference: SEBI/HO/IMD/{}/CIR/P/{}/{}\n\
             Date: {date}\n\
             \n\
             Subject: {topic}",
            category.to_uppercase(),
            self.rng.gen_range(1..100),
            self.rng.gen_range(2020..2026),
            self.rng.gen_range(100..1000),
        ));

        sections.push(format!(
            "1. BACKGROUND AND CONTEXT\n\
             \n\
             In exercise of powers conferred under Section {} of the Securities and \
             Exchange Board of India Act, 1992, and in pursuance of the objectives of investor protection and \
             development of the securities market, SEBI hereby issues the following {} on {topic}.\n\
             \n\
             This {} supersedes all previous circulars on this subject and shall come into force \
             with immediate effect from the date of issuance.",
            self.pick_num(&[11, 12, 19, 30]),
            category.to_lowercase(),
            category.to_lowercase(),
        ));

        sections.push(format!(
            "2. REGULATORY REQUIREMENTS\n\
             \n\
             2.1 Compliance Obligations\n\
             All registered intermediaries, market participants, and listed entities must ensure strict adherence \
             to the following provisions:\n\
             \n\
             a) Maintenance of adequate internal controls and risk management systems\n\
             b) Timely disclosure of material events within {} hours\n\
             c) Appointment of compliance officers with requisite qualifications\n\
             d) Quarterly reporting to SEBI through online portals\n\
             e) Annual certification by auditors regarding compliance status\n\
             \n\
             2.2 Documentation Requirements\n\
             Entities must maintain comprehensive records including:\n\
             - Transaction logs with timestamps and IP addresses\n\
             - Client communication records for minimum {} years\n\
             - Board meeting minutes and compliance committee reports\n\
             - KYC documents with periodic updates every {} months\n\
             \n\
             2.3 Financial Thresholds\n\
             Minimum net worth requirements: Rs. {} crores\n\
             Liquid assets requirement: Not less than {}% of net worth\n\
             Professional indemnity insurance: Minimum coverage of Rs. {} crores",
            self.pick_num(&[24, 48, 72]),
            self.pick_num(&[3, 5, 7]),
            self.pick_num(&[12, 24, 36]),
            self.pick_num(&[10, 25, 50, 100]),
            self.pick_num(&[15, 20, 25]),
            self.pick_num(&[5, 10, 25]),
        ));

        sections.push(format!(
            "3. PENAL PROVISIONS\n\
             \n\
             3.1 Non-compliance shall attract the following actions:\n\
             - Monetary penalty up to Rs. {} crore or {}% of turnover\n\
             - Suspension of registration for {} months\n\
             - Debarment from accessing securities market\n\
             - Criminal prosecution under applicable laws\n\
             \n\
             3.2 Entities must submit compliance reports within {} days failing which \
             late submission fees of Rs. {} per day",
            self.pick_num(&[1, 5, 10, 25]),
            self.pick_num(&[1, 2, 3]),
            self.pick_num(&[6, 12, 24]),
            self.pick_num(&[15, 30, 45]),
            self.pick_num(&[1000, 5000, 10000]),
        ));

        sections.push(format!(
            "4. IMPLEMENTATION TIMELINE\n\
             \n\
             Phase 1: Existing entities must comply within {} days\n\
             Phase 2: New applicants must comply from date of registration\n\
             Phase 3: SEBI shall conduct inspections starting from {}\n\
             \n\
             All stock exchanges, depositories, and clearing corporations are directed to ensure implementation \
             and report to SEBI on a monthly basis.",
            self.pick_num(&[90, 120, 180]),
            date + Duration::days(self.rng.gen_range(30..180)),
        ));

        sections.push(format!(
            "This circular is issued in public interest and for investor protection.\n\
             \n\
             For any clarifications, please contact:\n\
             Division of {}\n\
             Securities and Exchange Board of India\n\
             SEBI Bhavan, Plot No. C4-A, 'G' Block, Bandra-Kurla Complex\n\
             Bandra (East), Mumbai - 400 051",
            self.pick(DIVISIONS),
        ));

        sections.join("\n\n")
    }
}
