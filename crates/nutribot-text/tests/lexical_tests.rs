use nutribot_core::types::{RecipeCollection, RecipeId, RecipeRecord};
use nutribot_core::Error;
use nutribot_text::LexicalIndex;

fn collection(titles: &[&str]) -> RecipeCollection {
	let records = titles
		.iter()
		.map(|t| RecipeRecord {
			title: t.to_string(),
			rating: Some(4.0),
			calories: 250.0,
			protein: 10.0,
			fat: 5.0,
			sodium: 100.0,
			tags: Default::default(),
		})
		.collect();
	RecipeCollection::new(records, Default::default())
}

#[test]
fn vocabulary_is_sorted_and_excludes_stop_words() {
	let idx = LexicalIndex::build(&collection(&["The Chicken Soup", "Soup of the Day", "Grilled Chicken"])).unwrap();
	let terms: Vec<&str> = idx.vocabulary().keys().map(String::as_str).collect();
	assert_eq!(terms, vec!["chicken", "day", "grilled", "soup"]);
	let cols: Vec<usize> = idx.vocabulary().values().copied().collect();
	assert_eq!(cols, vec![0, 1, 2, 3]);
	assert_eq!(idx.n_rows(), 3);
}

#[test]
fn building_twice_is_identical() {
	let coll = collection(&["Apple Pie", "Apple Crumble", "Pumpkin Pie", "Steak"]);
	let a = LexicalIndex::build(&coll).unwrap();
	let b = LexicalIndex::build(&coll).unwrap();
	assert_eq!(a.vocabulary(), b.vocabulary());
	for id in coll.ids() {
		assert_eq!(a.row(id), b.row(id));
	}
}

#[test]
fn similarity_ranks_matching_titles_first() {
	let coll = collection(&["Apple Pie", "Beef Stew", "Apple Crumble"]);
	let idx = LexicalIndex::build(&coll).unwrap();
	let q = idx.transform("apple pie");
	let sims = idx.similarities(&q, &coll.ids().collect::<Vec<_>>()).unwrap();
	assert!(sims[0] > sims[2]);
	assert!(sims[2] > 0.0);
	assert_eq!(sims[1], 0.0);
	assert!((sims[0] - 1.0).abs() < 1e-5, "identical title has cosine 1, got {}", sims[0]);
}

#[test]
fn out_of_vocabulary_query_scores_zero() {
	let coll = collection(&["Apple Pie", "Beef Stew"]);
	let idx = LexicalIndex::build(&coll).unwrap();
	let q = idx.transform("quinoa salad");
	assert!(q.is_empty());
	let sims = idx.similarities(&q, &[RecipeId(0), RecipeId(1)]).unwrap();
	assert_eq!(sims, vec![0.0, 0.0]);
}

#[test]
fn subset_similarities_follow_the_given_ids() {
	let coll = collection(&["Apple Pie", "Beef Stew", "Beef Pie"]);
	let idx = LexicalIndex::build(&coll).unwrap();
	let q = idx.transform("beef");
	let sims = idx.similarities(&q, &[RecipeId(2), RecipeId(0)]).unwrap();
	assert!(sims[0] > 0.0);
	assert_eq!(sims[1], 0.0);
}

#[test]
fn empty_inputs_are_rejected() {
	assert!(matches!(LexicalIndex::build(&collection(&[])), Err(Error::EmptyCorpus(_))));
	assert!(matches!(LexicalIndex::build(&collection(&["", "the and of"])), Err(Error::EmptyCorpus(_))));
}

#[test]
fn ids_outside_the_matrix_are_alignment_errors() {
	let idx = LexicalIndex::build(&collection(&["Apple Pie"])).unwrap();
	let q = idx.transform("apple");
	match idx.similarities(&q, &[RecipeId(0), RecipeId(5)]) {
		Err(Error::Alignment { id, rows }) => assert_eq!((id, rows), (5, 1)),
		other => panic!("expected alignment error, got {other:?}"),
	}
}
