//! Derived read views: scholarships joined with their average review rating,
//! and the admin statistics breakdown.
//!
//! Each view exists twice. The `*_pipeline` functions build the MongoDB
//! aggregation run by [`crate::repository::MongoRepository`]; the plain
//! functions compute the same result over in-memory documents and are used by
//! [`crate::repository::MemoryRepository`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use mongodb::bson::{Document, doc};

use crate::models::{RatedScholarship, Review, Scholarship};

/// Number of entries on the home page "top scholarships" strip.
pub const TOP_SCHOLARSHIPS_LIMIT: usize = 6;

/// Arithmetic mean, or `None` for an empty input.
pub fn average_rating<I>(ratings: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0.0_f64, 0_u32), |(sum, count), r| (sum + r, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}

/// Listing order for the top strip: cheapest application first, newest post
/// breaking ties. A missing post date sorts after any present one.
pub fn listing_order(a_fees: f64, a_posted: &Option<String>, b_fees: f64, b_posted: &Option<String>) -> Ordering {
    a_fees
        .total_cmp(&b_fees)
        .then_with(|| b_posted.cmp(a_posted))
}

fn project(scholarship: Scholarship, reviews: &[Review]) -> RatedScholarship {
    // Reviews reference the scholarship by its hex id string.
    let key = scholarship.id.map(|id| id.to_hex());
    let average = average_rating(
        reviews
            .iter()
            .filter(|review| key.as_deref() == Some(review.scholarship_id.as_str()))
            .map(|review| review.rating),
    );

    RatedScholarship {
        id: scholarship.id,
        scholarship_name: scholarship.scholarship_name,
        university_name: scholarship.university_name,
        image: scholarship.image,
        university_country: scholarship.university_country,
        university_city: scholarship.university_city,
        university_rank: scholarship.university_rank,
        subject_category: scholarship.subject_category,
        scholarship_category: scholarship.scholarship_category,
        degree_category: scholarship.degree_category,
        tuition_fees: scholarship.tuition_fees,
        application_fees: scholarship.application_fees,
        application_deadline: scholarship.application_deadline,
        post_date: scholarship.post_date,
        average_rating: average,
    }
}

/// Every scholarship with its average rating, in input order.
pub fn rated_scholarships(scholarships: Vec<Scholarship>, reviews: &[Review]) -> Vec<RatedScholarship> {
    scholarships
        .into_iter()
        .map(|scholarship| project(scholarship, reviews))
        .collect()
}

/// The `limit` cheapest, most recent scholarships with their average rating.
pub fn top_scholarships(
    mut scholarships: Vec<Scholarship>,
    reviews: &[Review],
    limit: usize,
) -> Vec<RatedScholarship> {
    scholarships.sort_by(|a, b| {
        listing_order(a.application_fees, &a.post_date, b.application_fees, &b.post_date)
    });
    scholarships.truncate(limit);
    rated_scholarships(scholarships, reviews)
}

/// Scholarship count per subject category. Scholarships without a category
/// are not counted.
pub fn subject_category_counts<'a, I>(scholarships: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Scholarship>,
{
    let mut counts = BTreeMap::new();
    for category in scholarships
        .into_iter()
        .filter_map(|s| s.subject_category.as_ref())
    {
        *counts.entry(category.clone()).or_insert(0) += 1;
    }
    counts
}

// --- MongoDB pipelines ---

fn rating_stages() -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": "reviews",
                "let": { "scholarshipId": "$_id" },
                "pipeline": [
                    { "$match": { "$expr": {
                        "$eq": ["$scholarshipId", { "$toString": "$$scholarshipId" }]
                    } } }
                ],
                "as": "reviews",
            }
        },
        doc! {
            "$addFields": {
                "averageRating": {
                    "$avg": {
                        "$map": {
                            "input": "$reviews",
                            "as": "review",
                            "in": { "$toDouble": "$$review.rating" },
                        }
                    }
                }
            }
        },
        doc! {
            "$project": {
                "scholarshipName": 1,
                "universityName": 1,
                "image": 1,
                "universityCountry": 1,
                "universityCity": 1,
                "universityRank": 1,
                "subjectCategory": 1,
                "scholarshipCategory": 1,
                "degreeCategory": 1,
                "tuitionFees": 1,
                "applicationFees": 1,
                "applicationDeadline": 1,
                "postDate": 1,
                "averageRating": 1,
            }
        },
    ]
}

/// Pipeline behind GET /all-scholarships.
pub fn rated_scholarships_pipeline() -> Vec<Document> {
    rating_stages()
}

/// Pipeline behind GET /top-scholarships. Sorting and limiting happen before
/// the review lookup so only the surviving documents are joined.
pub fn top_scholarships_pipeline(limit: usize) -> Vec<Document> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut pipeline = vec![
        doc! { "$sort": { "applicationFees": 1, "postDate": -1 } },
        doc! { "$limit": limit },
    ];
    pipeline.extend(rating_stages());
    pipeline
}

/// Pipeline producing `{ subjectCategory, count }` rows for the admin stats.
pub fn subject_category_pipeline() -> Vec<Document> {
    vec![
        doc! { "$match": { "subjectCategory": { "$exists": true, "$ne": null } } },
        doc! { "$group": { "_id": "$subjectCategory", "count": { "$sum": 1 } } },
        doc! { "$project": { "_id": 0, "subjectCategory": "$_id", "count": 1 } },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_pipeline_sorts_before_lookup() {
        let pipeline = top_scholarships_pipeline(TOP_SCHOLARSHIPS_LIMIT);
        assert!(pipeline[0].contains_key("$sort"));
        assert_eq!(pipeline[1].get_i64("$limit").unwrap(), 6);
        assert!(pipeline[2].contains_key("$lookup"));
    }

    #[test]
    fn listing_order_prefers_present_post_date() {
        let dated = Some("2024-01-01".to_string());
        assert_eq!(listing_order(10.0, &dated, 10.0, &None), Ordering::Less);
    }
}
