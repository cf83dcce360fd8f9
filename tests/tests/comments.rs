use snoo_client::{
    api::{FullId, Kind},
    CommentTree,
};
use tests::{populated, start, tree_size, REPLIES_PER_LEVEL};

fn ids(tree: &CommentTree, id: &FullId) -> Vec<String> {
    tree.replies(id).iter().map(|c| c.id.clone()).collect()
}

#[tokio::test]
async fn whole_tree_at_once() {
    let (client, _mock) = start(populated()).await;
    let pc = client.post_and_comments("p1").await.unwrap();
    assert_eq!(pc.post.id, "p1");
    assert_eq!(pc.post.number_of_comments as usize, tree_size());
    assert!(!pc.has_more());
    assert_eq!(pc.tree.len(), tree_size());
    assert_eq!(ids(&pc.tree, pc.tree.root()), vec!["c0", "c1", "c2"]);
    assert_eq!(
        ids(&pc.tree, &FullId::new(Kind::Comment, "c1_2")),
        vec!["c1_2_0", "c1_2_1", "c1_2_2"]
    );
    // prefixed ids work too
    let again = client.post_and_comments("t3_p1").await.unwrap();
    assert_eq!(again.tree.len(), tree_size());
}

#[tokio::test]
async fn expanding_placeholders() {
    let mut mock = populated();
    mock.set_inline_replies(1);
    let (client, mock) = start(mock).await;

    let mut pc = client.post_and_comments("p1").await.unwrap();
    let root = pc.tree.root().clone();
    // only the first reply of each level came along
    assert_eq!(pc.tree.len(), 3);
    assert!(pc.has_more());
    let more = pc.tree.more(&root).unwrap();
    assert_eq!(more.children, vec![String::from("c1"), String::from("c2")]);

    pc.load_more(&client, &root).await.unwrap();
    assert!(!pc.has_more());
    assert_eq!(ids(&pc.tree, &root), vec!["c0", "c1", "c2"]);
    // c1 and c2 came flat along with everything below them
    assert_eq!(
        pc.tree.len(),
        3 + 2 * (1 + REPLIES_PER_LEVEL + REPLIES_PER_LEVEL * REPLIES_PER_LEVEL)
    );

    let req = mock.lock().requests().last().unwrap().clone();
    assert_eq!(req.path, "/api/morechildren");
    assert!(req.has_param("link_id", "t3_p1"));
    assert!(req.has_param("api_type", "json"));

    // expanding again does not hit the server
    let before = mock.lock().requests().len();
    pc.load_more(&client, &root).await.unwrap();
    assert_eq!(mock.lock().requests().len(), before);

    // the deeper placeholders below c0 are still pending
    let c0 = FullId::new(Kind::Comment, "c0");
    assert!(pc.tree.has_more(&c0));
    pc.load_more(&client, &c0).await.unwrap();
    assert_eq!(ids(&pc.tree, &c0), vec!["c0_0", "c0_1", "c0_2"]);
}

#[tokio::test]
async fn failed_expansion_can_be_retried() {
    let mut mock = populated();
    mock.set_inline_replies(2);
    let (client, mock) = start(mock).await;
    let mut pc = client.post_and_comments("p1").await.unwrap();
    let root = pc.tree.root().clone();

    mock.lock().fail_next(500, "oops");
    let err = pc.load_more(&client, &root).await.unwrap_err();
    assert!(err.is_transient());
    assert!(pc.has_more());

    pc.load_more(&client, &root).await.unwrap();
    assert!(!pc.has_more());
    assert_eq!(ids(&pc.tree, &root), vec!["c0", "c1", "c2"]);
}

#[tokio::test]
async fn nested_view_matches_tree() {
    let (client, _mock) = start(populated()).await;
    let pc = client.post_and_comments("p1").await.unwrap();
    let nested = pc.tree.nested(pc.tree.root());
    assert_eq!(nested.len(), REPLIES_PER_LEVEL);
    fn count(c: &[snoo_client::api::Comment]) -> usize {
        c.iter().map(|c| 1 + count(&c.replies.comments)).sum()
    }
    assert_eq!(count(&nested), tree_size());

    // a subtree can be rebuilt from any of those comments
    let sub = CommentTree::from_comment(nested[1].clone());
    assert_eq!(sub.root(), &FullId::new(Kind::Comment, "c1"));
    assert_eq!(sub.len(), REPLIES_PER_LEVEL + REPLIES_PER_LEVEL * REPLIES_PER_LEVEL);
}
