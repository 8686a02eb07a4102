mod helpers;

use helpers::builders::{ProjectBuilder, RoleBuilder, UserBuilder};
use helpers::db::TestDb;
use vivaria::authz::{resolve, resolve_many, EffectivePermissionSet, PermissionCache};
use vivaria::store::{self, ShareGrant};

#[tokio::test]
async fn test_super_admin_holds_every_capability() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let team = store::create_team(db, "Neuro Lab").await.unwrap();
    let root = UserBuilder::new("root").super_admin().create(db).await;

    // No memberships, no roles, no shares
    let p1 = ProjectBuilder::new("Maze Study", team.id).create(db).await;
    let p2 = ProjectBuilder::new("Sleep Study", team.id).create(db).await;

    let mut cache = PermissionCache::new();
    let set = resolve(db, &mut cache, &root, &p1).await.unwrap();
    assert_eq!(set, EffectivePermissionSet::all_granted());

    let many = resolve_many(db, &mut cache, &root, &[p1.clone(), p2.clone()])
        .await
        .unwrap();
    assert_eq!(many[&p1.id], EffectivePermissionSet::all_granted());
    assert_eq!(many[&p2.id], EffectivePermissionSet::all_granted());
}

#[tokio::test]
async fn test_no_grant_baseline_is_all_false() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner_team = store::create_team(db, "Neuro Lab").await.unwrap();
    let project = ProjectBuilder::new("Maze Study", owner_team.id)
        .create(db)
        .await;

    // Not a member of the owning team, no shares anywhere
    let outsider = UserBuilder::new("outsider").create(db).await;

    let mut cache = PermissionCache::new();
    let set = resolve(db, &mut cache, &outsider, &project).await.unwrap();

    assert_eq!(set, EffectivePermissionSet::default());
}

#[tokio::test]
async fn test_rbac_only_grants_follow_owning_team() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let team = store::create_team(db, "Neuro Lab").await.unwrap();
    let other_team = store::create_team(db, "Imaging Core").await.unwrap();
    let project = ProjectBuilder::new("Maze Study", team.id).create(db).await;

    let editor = RoleBuilder::new("Editor")
        .team_scoped(team.id)
        .granting("Project", "read")
        .granting("Project", "edit")
        .granting("ExperimentalGroup", "edit")
        .create(db)
        .await;

    let alice = UserBuilder::new("alice")
        .in_team(team.id)
        .in_team(other_team.id)
        .with_role(team.id, editor.id)
        .create(db)
        .await;

    let mut cache = PermissionCache::new();
    let set = resolve(db, &mut cache, &alice, &project).await.unwrap();

    assert!(set.is_owner_team_member);
    assert!(set.is_admin);
    assert!(set.can_view_project);
    assert!(set.can_edit_exp_groups);
    assert!(!set.can_delete_exp_groups);
    assert!(!set.can_view_unblinded);

    // Moving the role assignment to a different team must not grant
    // anything on this project
    store::remove_role_assignments(db, alice.id, editor.id)
        .await
        .unwrap();
    store::assign_role(db, alice.id, other_team.id, editor.id)
        .await
        .unwrap();

    let mut fresh_cache = PermissionCache::new();
    let set = resolve(db, &mut fresh_cache, &alice, &project)
        .await
        .unwrap();
    assert!(set.is_owner_team_member);
    assert!(!set.is_admin);
    assert!(!set.can_view_project);
    assert!(!set.can_edit_exp_groups);
}

#[tokio::test]
async fn test_team_share_without_membership_grants_only_shared_flags() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner_team = store::create_team(db, "Neuro Lab").await.unwrap();
    let guest_team = store::create_team(db, "Stats Unit").await.unwrap();

    let share = ShareGrant {
        can_view_project: true,
        can_view_unblinded: true,
        ..Default::default()
    };
    let project = ProjectBuilder::new("Maze Study", owner_team.id)
        .shared_with_team(guest_team.id, share)
        .create(db)
        .await;

    // Member of the guest team only; ownership is not a gate
    let carol = UserBuilder::new("carol").in_team(guest_team.id).create(db).await;

    let mut cache = PermissionCache::new();
    let set = resolve(db, &mut cache, &carol, &project).await.unwrap();

    assert!(set.can_view_project);
    assert!(set.can_view_unblinded);
    assert!(!set.is_owner_team_member);
    assert!(!set.is_admin);
    assert!(!set.can_edit_exp_groups);
}

#[tokio::test]
async fn test_share_widening_is_additive_and_reversible() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let team = store::create_team(db, "Neuro Lab").await.unwrap();
    let other_team = store::create_team(db, "Imaging Core").await.unwrap();
    let project = ProjectBuilder::new("Maze Study", team.id).create(db).await;

    let viewer = RoleBuilder::new("Viewer")
        .team_scoped(team.id)
        .granting("Project", "read")
        .create(db)
        .await;

    let alice = UserBuilder::new("alice")
        .in_team(team.id)
        .in_team(other_team.id)
        .with_role(team.id, viewer.id)
        .create(db)
        .await;

    let mut cache = PermissionCache::new();
    let before = resolve(db, &mut cache, &alice, &project).await.unwrap();
    assert!(before.can_view_project);
    assert!(!before.can_edit_exp_groups);

    // A team-share through alice's other team widens her capabilities
    let share = ShareGrant {
        can_edit_exp_groups: true,
        ..Default::default()
    };
    store::set_team_share(db, project.id, other_team.id, &share)
        .await
        .unwrap();

    let mut cache = PermissionCache::new();
    let widened = resolve(db, &mut cache, &alice, &project).await.unwrap();
    assert!(widened.can_view_project);
    assert!(widened.can_edit_exp_groups);

    // Monotonic: every flag set before is still set after
    assert!(!before.can_view_project || widened.can_view_project);
    assert!(!before.is_owner_team_member || widened.is_owner_team_member);

    // Removing the share restores the pre-share state exactly
    store::remove_team_share(db, project.id, other_team.id)
        .await
        .unwrap();

    let mut cache = PermissionCache::new();
    let after = resolve(db, &mut cache, &alice, &project).await.unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_user_and_team_shares_or_combine() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let owner_team = store::create_team(db, "Neuro Lab").await.unwrap();
    let guest_a = store::create_team(db, "Imaging Core").await.unwrap();
    let guest_b = store::create_team(db, "Stats Unit").await.unwrap();

    let bob = UserBuilder::new("bob")
        .in_team(guest_a.id)
        .in_team(guest_b.id)
        .create(db)
        .await;

    // Three sources, each granting a disjoint capability
    let project = ProjectBuilder::new("Maze Study", owner_team.id)
        .shared_with_user(
            bob.id,
            ShareGrant {
                can_view_project: true,
                ..Default::default()
            },
        )
        .shared_with_team(
            guest_a.id,
            ShareGrant {
                can_edit_datatables: true,
                ..Default::default()
            },
        )
        .shared_with_team(
            guest_b.id,
            ShareGrant {
                can_view_unblinded: true,
                ..Default::default()
            },
        )
        .create(db)
        .await;

    let mut cache = PermissionCache::new();
    let set = resolve(db, &mut cache, &bob, &project).await.unwrap();

    assert!(set.can_view_project);
    assert!(set.can_edit_datatables);
    assert!(set.can_view_unblinded);
    assert!(!set.can_delete_datatables);
    assert!(!set.is_owner_team_member);
}

#[tokio::test]
async fn test_cache_hit_returns_identical_set_without_refetch() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let team = store::create_team(db, "Neuro Lab").await.unwrap();
    let project = ProjectBuilder::new("Maze Study", team.id).create(db).await;

    let alice = UserBuilder::new("alice").in_team(team.id).create(db).await;
    store::set_user_share(db, project.id, alice.id, &ShareGrant::view_only())
        .await
        .unwrap();

    let mut cache = PermissionCache::new();
    let first = resolve(db, &mut cache, &alice, &project).await.unwrap();
    let second = resolve(db, &mut cache, &alice, &project).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.len(), 1);

    // Mutate grant state; a cache hit must serve the memoized set, which
    // proves the second call never went back to the store
    store::remove_user_share(db, project.id, alice.id)
        .await
        .unwrap();

    let stale = resolve(db, &mut cache, &alice, &project).await.unwrap();
    assert_eq!(stale, first);

    // A fresh request-scoped cache observes the new grant state
    let mut fresh_cache = PermissionCache::new();
    let current = resolve(db, &mut fresh_cache, &alice, &project)
        .await
        .unwrap();
    assert!(!current.can_view_project);
}

#[tokio::test]
async fn test_bulk_resolution_matches_single_path_for_every_project() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let home_team = store::create_team(db, "Neuro Lab").await.unwrap();
    let side_team = store::create_team(db, "Imaging Core").await.unwrap();
    let foreign_team = store::create_team(db, "Botany Wing").await.unwrap();

    let editor = RoleBuilder::new("Editor")
        .team_scoped(home_team.id)
        .granting("Project", "read")
        .granting("Project", "edit")
        .granting("ExperimentalGroup", "edit")
        .create(db)
        .await;

    let alice = UserBuilder::new("alice")
        .in_team(home_team.id)
        .in_team(side_team.id)
        .with_role(home_team.id, editor.id)
        .create(db)
        .await;

    // A grant matrix across 50 projects: owned/foreign owner teams,
    // user-shares, team-shares, overlaps, and no grants at all
    let mut projects = Vec::new();
    for i in 0..50 {
        let owner = if i % 2 == 0 { home_team.id } else { foreign_team.id };
        let mut builder = ProjectBuilder::new(&format!("Study {i}"), owner);

        if i % 3 == 0 {
            builder = builder.shared_with_user(
                alice.id,
                ShareGrant {
                    can_view_project: true,
                    can_delete_datatables: true,
                    ..Default::default()
                },
            );
        }
        if i % 5 == 0 {
            builder = builder.shared_with_team(
                side_team.id,
                ShareGrant {
                    can_view_unblinded: true,
                    ..Default::default()
                },
            );
        }

        projects.push(builder.create(db).await);
    }

    let mut bulk_cache = PermissionCache::new();
    let many = resolve_many(db, &mut bulk_cache, &alice, &projects)
        .await
        .unwrap();
    assert_eq!(many.len(), projects.len());

    for project in &projects {
        let mut single_cache = PermissionCache::new();
        let single = resolve(db, &mut single_cache, &alice, project)
            .await
            .unwrap();
        assert_eq!(
            many[&project.id], single,
            "bulk and single paths diverged on project {}",
            project.id
        );
    }

    // Every computed entry landed in the bulk call's cache
    assert_eq!(bulk_cache.len(), projects.len());
}

#[tokio::test]
async fn test_bulk_resolution_serves_cached_entries() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let team = store::create_team(db, "Neuro Lab").await.unwrap();
    let alice = UserBuilder::new("alice").create(db).await;

    let p1 = ProjectBuilder::new("Maze Study", team.id)
        .shared_with_user(alice.id, ShareGrant::view_only())
        .create(db)
        .await;
    let p2 = ProjectBuilder::new("Sleep Study", team.id).create(db).await;

    let mut cache = PermissionCache::new();
    let first = resolve(db, &mut cache, &alice, &p1).await.unwrap();

    // Invalidate p1's share; the bulk call must still serve the
    // memoized entry for p1 while computing p2 fresh
    store::remove_user_share(db, p1.id, alice.id).await.unwrap();

    let many = resolve_many(db, &mut cache, &alice, &[p1.clone(), p2.clone()])
        .await
        .unwrap();
    assert_eq!(many[&p1.id], first);
    assert_eq!(many[&p2.id], EffectivePermissionSet::default());
}

#[tokio::test]
async fn test_bulk_resolution_with_empty_input() {
    let test_db = TestDb::new().await;
    let db = test_db.connection();

    let alice = UserBuilder::new("alice").create(db).await;

    let mut cache = PermissionCache::new();
    let many = resolve_many(db, &mut cache, &alice, &[]).await.unwrap();
    assert!(many.is_empty());
    assert!(cache.is_empty());
}
