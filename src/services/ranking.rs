//! Aggregates over complaint collections. Everything here is a pure function
//! of its input and is recomputed on every request.

use crate::models::{ComplaintModel, UNKNOWN_COMPANY};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

pub const RANKING_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CompanyRank {
    pub company: String,
    pub count: u64,
}

/// Companies with the most complaints, most first, at most [`RANKING_LIMIT`].
///
/// Complaints without a company are grouped under [`UNKNOWN_COMPANY`]. Equal
/// counts keep the order in which each company first appears in `complaints`.
pub fn rank_companies(complaints: &[ComplaintModel]) -> Vec<CompanyRank> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut ranking: Vec<CompanyRank> = Vec::new();

    for complaint in complaints {
        let company = company_label(&complaint.company);
        match index.get(company) {
            Some(&i) => ranking[i].count += 1,
            None => {
                index.insert(company, ranking.len());
                ranking.push(CompanyRank {
                    company: company.to_string(),
                    count: 1,
                });
            }
        }
    }

    // Stable: ties stay in first-appearance order.
    ranking.sort_by(|a, b| b.count.cmp(&a.count));
    ranking.truncate(RANKING_LIMIT);
    ranking
}

fn company_label(company: &str) -> &str {
    if company.trim().is_empty() {
        UNKNOWN_COMPANY
    } else {
        company
    }
}

/// Totals shown next to every complaint listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct TypeCounts {
    pub total: u64,
    pub moral: u64,
    pub sexual: u64,
    pub salarial: u64,
    /// Any other type tag; `total` is always the sum of the four
    pub other: u64,
}

impl TypeCounts {
    /// Case-sensitive match on the type tag; anything else counts as `other`.
    pub fn from_complaints(complaints: &[ComplaintModel]) -> Self {
        complaints.iter().fold(Self::default(), |mut acc, c| {
            acc.total += 1;
            match c.kind.as_str() {
                "moral" => acc.moral += 1,
                "sexual" => acc.sexual += 1,
                "salarial" => acc.salarial += 1,
                _ => acc.other += 1,
            }
            acc
        })
    }
}
