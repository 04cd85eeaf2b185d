use std::fs;

use tempfile::TempDir;

use nutribot_core::types::{DietaryTag, RecipeCollection, RecipeId, RecipeRecord, TagSet};
use nutribot_core::Error;
use nutribot_recommend::{
    build_recipe_index, recommend, CalorieBand, KeywordMatch, PreferenceQuery, ProteinBand, RankContext, RankingStrategy,
    RecommendationEngine,
};
use nutribot_text::LexicalIndex;

fn recipe(title: &str, rating: Option<f64>, calories: f64, protein: f64, tags: &[DietaryTag]) -> RecipeRecord {
    RecipeRecord {
        title: title.to_string(),
        rating,
        calories,
        protein,
        fat: 10.0,
        sodium: 200.0,
        tags: tags.iter().copied().collect(),
    }
}

fn sample() -> RecipeCollection {
    let tag_columns: TagSet = [DietaryTag::Vegetarian, DietaryTag::GlutenFree].into_iter().collect();
    RecipeCollection::new(
        vec![
            recipe("Apple Pie", Some(4.5), 300.0, 2.0, &[DietaryTag::Vegetarian]),
            recipe("Steak", Some(4.0), 600.0, 40.0, &[DietaryTag::GlutenFree]),
            recipe("Chicken Soup", None, 350.0, 20.0, &[DietaryTag::GlutenFree]),
            recipe("Apple Crumble", Some(3.5), 450.0, 4.0, &[DietaryTag::Vegetarian, DietaryTag::GlutenFree]),
            recipe("Chicken Curry", Some(4.8), 750.0, 35.0, &[DietaryTag::GlutenFree]),
            recipe("Garden Salad", Some(4.0), 150.0, 5.0, &[DietaryTag::Vegetarian, DietaryTag::GlutenFree]),
        ],
        tag_columns,
    )
}

fn titles(out: &[nutribot_core::RecipeSummary]) -> Vec<&str> {
    out.iter().map(|r| r.title.as_str()).collect()
}

fn ranked(query: &PreferenceQuery, coll: &RecipeCollection, limit: usize) -> Vec<String> {
    let index = LexicalIndex::build(coll).unwrap();
    recommend(query, coll, Some(&index), limit).into_iter().map(|r| r.title).collect()
}

#[test]
fn low_calorie_band_keeps_only_apple_pie() {
    let coll = RecipeCollection::new(
        vec![recipe("Apple Pie", Some(4.5), 300.0, 2.0, &[]), recipe("Steak", Some(4.0), 600.0, 40.0, &[])],
        TagSet::new(),
    );
    let query = PreferenceQuery::builder().calorie_label("Low (<400)").build();
    assert_eq!(ranked(&query, &coll, 50), vec!["Apple Pie"]);
}

#[test]
fn empty_collection_gives_empty_result() {
    let query = PreferenceQuery::builder()
        .calorie_band(CalorieBand::High)
        .tag(DietaryTag::Vegan)
        .keywords("anything at all")
        .build();
    assert!(recommend(&query, &RecipeCollection::default(), None, 10).is_empty());
}

#[test]
fn missing_index_gives_empty_result() {
    let coll = RecipeCollection::new(
        vec![recipe("Apple Pie", Some(3.0), 300.0, 2.0, &[]), recipe("Steak", Some(5.0), 600.0, 40.0, &[])],
        TagSet::new(),
    );
    assert!(recommend(&PreferenceQuery::default(), &coll, None, 10).is_empty());
    let query = PreferenceQuery::builder().keywords("steak").build();
    assert!(recommend(&query, &coll, None, 10).is_empty());
}

#[test]
fn no_keywords_sorts_by_rating_with_unrated_last() {
    let coll = sample();
    let index = LexicalIndex::build(&coll).unwrap();
    let out = recommend(&PreferenceQuery::default(), &coll, Some(&index), 50);
    assert_eq!(
        titles(&out),
        vec!["Chicken Curry", "Apple Pie", "Steak", "Garden Salad", "Apple Crumble", "Chicken Soup"]
    );
    let json = serde_json::to_value(&out[5]).unwrap();
    assert!(json.get("rating").is_none(), "absent rating is omitted");
}

#[test]
fn whitespace_keywords_rank_like_unknown_words() {
    let coll = RecipeCollection::new(
        vec![recipe("Apple Pie", Some(3.0), 300.0, 2.0, &[]), recipe("Steak", Some(5.0), 600.0, 40.0, &[])],
        TagSet::new(),
    );
    let blank = ranked(&PreferenceQuery::builder().keywords("   ").build(), &coll, 10);
    let stop_word = ranked(&PreferenceQuery::builder().keywords("the").build(), &coll, 10);
    assert_eq!(blank, vec!["Apple Pie", "Steak"]);
    assert_eq!(blank, stop_word);
    assert_eq!(ranked(&PreferenceQuery::default(), &coll, 10), vec!["Steak", "Apple Pie"]);
}

#[test]
fn tags_are_conjunctive_and_unknown_columns_ignored() {
    let coll = sample();
    let query = PreferenceQuery::builder()
        .tag(DietaryTag::Vegetarian)
        .tag(DietaryTag::GlutenFree)
        .tag(DietaryTag::Vegan)
        .build();
    let index = LexicalIndex::build(&coll).unwrap();
    let out = recommend(&query, &coll, Some(&index), 50);
    assert_eq!(titles(&out), vec!["Garden Salad", "Apple Crumble"]);
    for r in &out {
        let rec = coll.records().iter().find(|c| c.title == r.title).unwrap();
        assert!(rec.has_tag(DietaryTag::Vegetarian) && rec.has_tag(DietaryTag::GlutenFree));
    }
}

#[test]
fn bands_combine_and_results_respect_limits() {
    let coll = sample();
    let query = PreferenceQuery::builder().protein_band(ProteinBand::High).build();
    let index = LexicalIndex::build(&coll).unwrap();
    let out = recommend(&query, &coll, Some(&index), 50);
    assert_eq!(titles(&out), vec!["Chicken Curry", "Steak"]);
    assert!(out.iter().all(|r| r.protein >= 30.0));

    for limit in [0, 1, 3] {
        assert!(recommend(&PreferenceQuery::default(), &coll, Some(&index), limit).len() <= limit);
    }
}

#[test]
fn unknown_band_label_skips_the_filter() {
    let coll = sample();
    let query = PreferenceQuery::builder().calorie_label("Enormous").protein_label("medium").build();
    assert_eq!(query.calorie_band, CalorieBand::Any);
    assert_eq!(ranked(&query, &coll, 50), vec!["Chicken Soup"]);
}

#[test]
fn keywords_rank_by_similarity_with_stable_ties() {
    let coll = sample();
    let index = LexicalIndex::build(&coll).unwrap();
    let query = PreferenceQuery::builder().keywords("chicken").build();
    let out = recommend(&query, &coll, Some(&index), 2);
    assert_eq!(titles(&out), vec!["Chicken Soup", "Chicken Curry"]);

    let query = PreferenceQuery::builder().keywords("quinoa").build();
    let out = recommend(&query, &coll, Some(&index), 50);
    assert_eq!(out.len(), coll.len(), "zero similarity keeps every survivor");
    assert_eq!(out[0].title, "Apple Pie", "all ties keep collection order");
}

#[test]
fn misaligned_index_falls_back_to_word_match() {
    let coll = sample();
    let other = RecipeCollection::new(vec![recipe("Apple Pie", None, 1.0, 1.0, &[])], TagSet::new());
    let stale = LexicalIndex::build(&other).unwrap();
    let query = PreferenceQuery::builder().keywords("APPLE").build();
    let out = recommend(&query, &coll, Some(&stale), 50);
    assert_eq!(titles(&out), vec!["Apple Pie", "Apple Crumble"]);
}

#[test]
fn word_match_requires_whole_words() {
    let coll = RecipeCollection::new(
        vec![recipe("Pineapple Tart", Some(5.0), 100.0, 1.0, &[]), recipe("Apple Tart", Some(3.0), 100.0, 1.0, &[])],
        TagSet::new(),
    );
    let index = LexicalIndex::build(&coll).unwrap();
    let ctx = RankContext { collection: &coll, index: &index, keywords: "apple" };
    let ids: Vec<RecipeId> = coll.ids().collect();
    assert_eq!(KeywordMatch.rank(&ids, &ctx).unwrap(), vec![RecipeId(1)]);
}

#[test]
fn engine_output_does_not_depend_on_strategy_instances() {
    let coll = sample();
    let index = LexicalIndex::build(&coll).unwrap();
    let query = PreferenceQuery::builder().keywords("apple pie").calorie_band(CalorieBand::Low).build();
    let a = RecommendationEngine::default().recommend(&query, &coll, Some(&index), 5);
    let b = recommend(&query, &coll, Some(&index), 5);
    assert_eq!(a, b);
    assert_eq!(a[0].title, "Apple Pie");
}

#[test]
fn build_recipe_index_from_csv() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("recipes.csv");
    fs::write(&path, "title,rating,calories,protein,fat,sodium,vegan\nLentil Dal,4.2,380,18,6,300,1\nBeef Chili,4.6,650,35,25,900,0\n").unwrap();
    let (coll, index) = build_recipe_index(&path).unwrap();
    assert_eq!(coll.len(), 2);
    assert_eq!(index.n_rows(), 2);

    let query = PreferenceQuery::builder().tag_names(["vegan", "notATag"]).build();
    assert_eq!(titles(&recommend(&query, &coll, Some(&index), 50)), vec!["Lentil Dal"]);

    assert!(matches!(build_recipe_index(&tmp.path().join("missing.csv")), Err(Error::Load { .. })));
}
