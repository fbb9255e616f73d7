use time::macros::date;
use time::Date;
use uuid::Uuid;

use crate::articles::dto::Tier;
use crate::articles::repo_types::Article;

struct Seed {
    slug: &'static str,
    title: &'static str,
    original_title: &'static str,
    journal: &'static str,
    doi: &'static str,
    topic: &'static str,
    tier: Tier,
    study_n: i32,
    study_endpoint: &'static str,
    study_limitations: &'static str,
    key_messages: [&'static str; 3],
    clinical_insight: &'static str,
    published_at: Date,
}

const SEEDS: [Seed; 8] = [
    Seed {
        slug: "sglt2-heart-failure-2026",
        title: "SGLT2 inhibitors cut heart failure hospitalisation by 35% in a large trial",
        original_title: "Effect of SGLT2 Inhibitors on Heart Failure Hospitalization",
        journal: "New England Journal of Medicine",
        doi: "10.1056/NEJMoa2026001",
        topic: "cardiovascular",
        tier: Tier::Basic,
        study_n: 12500,
        study_endpoint: "Primary: Heart failure hospitalization + CV death",
        study_limitations: "3-year follow-up needed, 15% Asian representation",
        key_messages: [
            "SGLT2 inhibitors reduced heart failure hospitalisation by 35% (HR 0.65, P<0.001)",
            "eGFR decline slowed by 40%, confirming a renal protective effect",
            "Cardiovascular mortality fell by 20% on top of standard care",
        ],
        clinical_insight: "SGLT2 inhibitors should be actively considered in both HFrEF and HFpEF.",
        published_at: date!(2026 - 02 - 15),
    },
    Seed {
        slug: "glp1-weight-loss-2026",
        title: "GLP-1 receptor agonists achieve 15% average weight loss",
        original_title: "GLP-1 Receptor Agonists for Weight Management: A Meta-Analysis",
        journal: "The Lancet",
        doi: "10.1016/S0140-6736(26)00123",
        topic: "endocrine",
        tier: Tier::Basic,
        study_n: 8400,
        study_endpoint: "Primary: Percent body weight change at 68 weeks",
        study_limitations: "High cost limits accessibility, GI side effects common",
        key_messages: [
            "Mean weight loss of 15.2% (12.4% over placebo, P<0.001)",
            "Blood pressure, LDL and HbA1c improved at the same time",
            "Nausea and vomiting in 30% of patients, mostly mild",
        ],
        clinical_insight: "GLP-1 RAs can be first-line drug therapy for BMI 30+ or BMI 27+ with metabolic complications.",
        published_at: date!(2026 - 02 - 14),
    },
    Seed {
        slug: "tirzepatide-diabetes-2026",
        title: "Tirzepatide vs semaglutide: HbA1c down 2.4%, body weight down 21%",
        original_title: "Tirzepatide vs Semaglutide Head-to-Head Trial",
        journal: "New England Journal of Medicine",
        doi: "10.1056/NEJMoa2026002",
        topic: "endocrine",
        tier: Tier::Pro,
        study_n: 3200,
        study_endpoint: "Primary: HbA1c change and body weight change at 72 weeks",
        study_limitations: "Open-label design, mostly Caucasian population",
        key_messages: [
            "Tirzepatide lowered HbA1c 0.5% more than semaglutide (2.4% vs 1.9%, P<0.001)",
            "Weight loss was 6 points greater (21.1% vs 15.0%, P<0.001)",
            "GI side effects were common with both drugs, tolerability was similar",
        ],
        clinical_insight: "In type 2 diabetes with obesity, tirzepatide is superior for both glycaemic control and weight loss.",
        published_at: date!(2026 - 02 - 13),
    },
    Seed {
        slug: "metformin-tame-aging-2026",
        title: "TAME trial: metformin reduces age-related disease by 21%",
        original_title: "TAME Trial: Targeting Aging with Metformin",
        journal: "Nature Medicine",
        doi: "10.1038/s41591-026-0001",
        topic: "aging",
        tier: Tier::Pro,
        study_n: 3000,
        study_endpoint: "Primary: Composite of cancer, CVD, dementia, and mortality",
        study_limitations: "Observational component, GI side effects, vitamin B12 monitoring needed",
        key_messages: [
            "In non-diabetic adults aged 65-79, metformin cut the composite of cancer, CVD, dementia and death by 21% (HR 0.79, P<0.001)",
            "Lower inflammatory markers and better insulin sensitivity are the likely mechanisms",
            "Serious adverse events were rare apart from GI symptoms",
        ],
        clinical_insight: "There is now a scientific basis for repurposing metformin to prevent age-related disease.",
        published_at: date!(2026 - 02 - 12),
    },
    Seed {
        slug: "senolytics-ipf-2026",
        title: "Senolytic therapy improves exercise capacity in pulmonary fibrosis",
        original_title: "Senolytics in Idiopathic Pulmonary Fibrosis: Phase 2 Trial",
        journal: "Lancet Respiratory Medicine",
        doi: "10.1016/S2213-2600(26)00045",
        topic: "aging",
        tier: Tier::Basic,
        study_n: 120,
        study_endpoint: "Primary: 6-minute walk distance change at 24 weeks",
        study_limitations: "Small sample size, short follow-up, single-center",
        key_messages: [
            "Intermittent dasatinib plus quercetin added 35 m to the 6-minute walk in IPF (P=0.008)",
            "FVC decline slowed and the senescence marker p16INK4a fell by 40%",
            "Side effects were manageable with a good safety profile",
        ],
        clinical_insight: "Targeting senescent cells opens a new treatment avenue in IPF.",
        published_at: date!(2026 - 02 - 11),
    },
    Seed {
        slug: "cgm-type2-diabetes-2026",
        title: "Continuous glucose monitoring sharply improves control in type 2 diabetes",
        original_title: "Continuous Glucose Monitoring in Type 2 Diabetes Management",
        journal: "JAMA",
        doi: "10.1001/jama.2026.1234",
        topic: "diabetes",
        tier: Tier::Basic,
        study_n: 800,
        study_endpoint: "Primary: HbA1c change and time in range at 6 months",
        study_limitations: "Unblinded design, Hawthorne effect possible",
        key_messages: [
            "CGM lowered HbA1c by a further 0.5% in type 2 patients on basal insulin",
            "Time in range rose from 59% to 73%",
            "Hypoglycaemic events halved",
        ],
        clinical_insight: "CGM is strongly recommended for insulin-treated type 2 diabetes.",
        published_at: date!(2026 - 02 - 10),
    },
    Seed {
        slug: "stem-cell-islet-t1d-2026",
        title: "Stem-cell-derived islets make 65% of type 1 patients insulin independent",
        original_title: "Stem Cell-Derived Islet Transplantation for Type 1 Diabetes",
        journal: "New England Journal of Medicine",
        doi: "10.1056/NEJMoa2026003",
        topic: "diabetes",
        tier: Tier::Pro,
        study_n: 40,
        study_endpoint: "Primary: Insulin independence at 12 months",
        study_limitations: "Very small sample, single-arm design, long-term durability unknown",
        key_messages: [
            "65% were insulin independent 12 months after encapsulated islet transplantation",
            "C-peptide secretion was detected in 88% without immunosuppression",
            "Severe hypoglycaemia dropped from 6.2 to 0.3 episodes per year",
        ],
        clinical_insight: "A landmark study pointing towards a cure for type 1 diabetes.",
        published_at: date!(2026 - 02 - 09),
    },
    Seed {
        slug: "colchicine-cv-prevention-2026",
        title: "Low-dose colchicine cuts cardiovascular events by 23% in secondary prevention",
        original_title: "Low-dose Colchicine in Secondary Cardiovascular Prevention",
        journal: "The Lancet",
        doi: "10.1016/S0140-6736(26)00456",
        topic: "cardiovascular",
        tier: Tier::Pro,
        study_n: 7500,
        study_endpoint: "Primary: MACE (CV death, MI, stroke)",
        study_limitations: "GI intolerance in 8%, drug interactions with statins",
        key_messages: [
            "Colchicine 0.5 mg/day reduced MACE by 23% in stable coronary disease (HR 0.77, P<0.001)",
            "An anti-inflammatory approach to residual cardiovascular risk",
            "Nausea rose slightly while serious adverse events were similar",
        ],
        clinical_insight: "Consider adding low-dose colchicine for coronary patients with residual risk despite optimal therapy.",
        published_at: date!(2026 - 02 - 08),
    },
];

/// Demo article set for the in-memory backend. Ids are stable across restarts.
pub fn demo_articles() -> Vec<Article> {
    SEEDS
        .iter()
        .enumerate()
        .map(|(i, s)| Article {
            id: Uuid::from_u128(i as u128 + 1),
            slug: s.slug.into(),
            title: s.title.into(),
            original_title: Some(s.original_title.into()),
            journal: s.journal.into(),
            doi: Some(s.doi.into()),
            pmid: None,
            topic: s.topic.into(),
            tier: s.tier,
            key_messages: s.key_messages.iter().map(|m| m.to_string()).collect(),
            study_n: Some(s.study_n),
            study_endpoint: Some(s.study_endpoint.into()),
            study_limitations: Some(s.study_limitations.into()),
            clinical_insight: s.clinical_insight.into(),
            published_at: s.published_at,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn demo_set_covers_all_topics_with_unique_slugs() {
        let articles = demo_articles();
        let slugs: HashSet<_> = articles.iter().map(|a| a.slug.as_str()).collect();
        assert_eq!(slugs.len(), 8);

        let topics: HashSet<_> = articles.iter().map(|a| a.topic.as_str()).collect();
        assert_eq!(
            topics,
            HashSet::from(["cardiovascular", "endocrine", "aging", "diabetes"])
        );
        assert_eq!(articles.iter().filter(|a| a.tier == Tier::Pro).count(), 4);
        assert!(articles.iter().all(|a| a.key_messages.len() == 3));
    }
}
