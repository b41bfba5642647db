// CpVerify: Symbolic Control-Plane Verification
// Copyright (C) 2026  The CpVerify Authors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use crate::encoder::*;
use crate::example_networks::*;
use crate::netconf::Protocol::*;
use crate::netconf::{
    BooleanExpr, Community, CommunitySetExpr, Configuration, Network, Protocol, RoutingPolicy, Statement,
    ValueExpr,
};
use crate::smt::*;

use lazy_static::lazy_static;
use maplit::btreemap;
use std::collections::BTreeMap;

lazy_static! {
    static ref C1: Community = Community::new(1, 1);
    static ref C2: Community = Community::new(2, 2);
    static ref C3: Community = Community::new(3, 3);
}

/// Allocate an input and an output record of the same shape
fn records(
    ctx: &mut Context,
    registry: &CommunityRegistry,
    proto: Protocol,
    shape: RecordShape,
) -> (SymbolicRoute, SymbolicRoute) {
    let input = SymbolicRoute::new(ctx, "in", Some(proto), RecordKind::Export, shape, registry);
    let output = SymbolicRoute::new(ctx, "out", Some(proto), RecordKind::Import, shape, registry);
    (input, output)
}

fn metric_shape() -> RecordShape {
    RecordShape { metric: true, ..Default::default() }
}

#[test]
fn ospf_metric_overflow() {
    let net = OspfOverflowNet::net();
    let conf = net.config("r2").unwrap();
    let registry = CommunityRegistry::from_network(&net).unwrap();
    let mut ctx = Context::new();
    let packet = SymbolicPacket::new(&mut ctx, "");
    let (input, output) = records(&mut ctx, &registry, Ospf, metric_shape());

    let mut params = TransferParams::new("r2_OSPF_IMPORT_eth0", Ospf, TransferKind::Import);
    params.cost = 5;
    let permitted = TransferFunction::new(&mut ctx, conf, &registry, &packet, params)
        .compute(&input, &output)
        .unwrap();

    let metric = input.metric.get().unwrap();
    let mut asg = PartialAssignment::new();
    asg.set_bool(&input.permitted, true).set_int(metric, 65533);
    // 65533 + 5 exceeds the maximal OSPF metric
    assert_eq!(permitted.eval(&asg), Some(false));
    asg.set_int(metric, 65530);
    assert_eq!(permitted.eval(&asg), Some(true));
    asg.set_bool(&input.permitted, false);
    assert_eq!(permitted.eval(&asg), Some(false));
}

#[test]
fn failed_link_blocks_transfer() {
    let net = StaticChain::net();
    let conf = net.config("r1").unwrap();
    let registry = CommunityRegistry::from_network(&net).unwrap();
    let mut ctx = Context::new();
    let packet = SymbolicPacket::new(&mut ctx, "");
    let (input, output) = records(&mut ctx, &registry, Ospf, metric_shape());

    let mut params = TransferParams::new("t", Ospf, TransferKind::Import);
    params.guard = BoolExpr::ff();
    let before = ctx.num_constraints();
    let permitted = TransferFunction::new(&mut ctx, conf, &registry, &packet, params)
        .compute(&input, &output)
        .unwrap();
    assert!(permitted.is_false());
    // the output is forced to carry no route
    assert_eq!(ctx.num_constraints(), before + 1);
    assert_eq!(ctx.constraints()[before], output.permitted.not());
}

#[test]
fn undefined_policy_calls() {
    let net = Network::new();
    let registry = CommunityRegistry::from_network(&net).unwrap();
    let mut conf = Configuration::new("r1");
    conf.add_routing_policy(RoutingPolicy::new(
        "CALLER",
        vec![Statement::CallStatement("MISSING".to_string()), Statement::ExitAccept],
    ));
    conf.add_routing_policy(RoutingPolicy::new(
        "LOOP",
        vec![Statement::CallStatement("LOOP".to_string()), Statement::ExitAccept],
    ));
    let mut ctx = Context::new();
    let packet = SymbolicPacket::new(&mut ctx, "");
    let (input, output) = records(&mut ctx, &registry, Bgp, metric_shape());

    let mut params = TransferParams::new("t", Bgp, TransferKind::Import);
    params.policy = conf.routing_policies.get("CALLER");
    let result = TransferFunction::new(&mut ctx, &conf, &registry, &packet, params).compute(&input, &output);
    assert_eq!(
        result.unwrap_err(),
        EncoderError::UndefinedPolicy("r1".to_string(), "MISSING".to_string())
    );

    let mut params = TransferParams::new("t", Bgp, TransferKind::Import);
    params.policy = conf.routing_policies.get("LOOP");
    let result = TransferFunction::new(&mut ctx, &conf, &registry, &packet, params).compute(&input, &output);
    assert_eq!(result.unwrap_err(), EncoderError::RecursivePolicy("LOOP".to_string()));
}

fn tagged(c: Community) -> BooleanExpr {
    BooleanExpr::MatchCommunitySet(CommunitySetExpr::Literal(vec![c]))
}

fn branch(guard: BooleanExpr, t: Vec<Statement>, f: Vec<Statement>) -> Statement {
    Statement::If { guard, true_statements: t, false_statements: f }
}

fn local_pref(x: u32) -> Statement {
    Statement::SetLocalPreference(ValueExpr::Literal(x))
}

fn router(policies: Vec<RoutingPolicy>) -> Configuration {
    let mut conf = Configuration::new("r1");
    for p in policies {
        conf.add_routing_policy(p);
    }
    conf
}

fn export(ibgp: bool, reflector: bool, area: Option<u32>) -> TransferKind {
    TransferKind::Export { ibgp, reflector, send_community: true, router_id: None, area }
}

/// One transfer function between two fresh records, evaluated without a solver.
struct Run {
    ctx: Context,
    input: SymbolicRoute,
    output: SymbolicRoute,
    permitted: BoolExpr,
}

impl Run {
    fn new(
        conf: &Configuration,
        proto: Protocol,
        kind: TransferKind,
        policy: Option<&str>,
        shape: RecordShape,
    ) -> Self {
        let mut net = Network::new();
        net.add_config(conf.clone()).unwrap();
        let registry = CommunityRegistry::from_network(&net).unwrap();
        let mut ctx = Context::new();
        let packet = SymbolicPacket::new(&mut ctx, "");
        let (input, output) = records(&mut ctx, &registry, proto, shape);
        let mut params = TransferParams::new("t", proto, kind);
        params.policy = policy.map(|p| &conf.routing_policies[p]);
        let permitted = TransferFunction::new(&mut ctx, conf, &registry, &packet, params)
            .compute(&input, &output)
            .unwrap();
        Self { ctx, input, output, permitted }
    }

    /// BGP route with local preference 100 and the given communities.
    fn bgp(&self, communities: &[Community]) -> PartialAssignment {
        let mut asg = PartialAssignment::new();
        asg.set_bool(&self.input.permitted, true);
        if let Some(lp) = self.input.local_pref.get() {
            asg.set_int(lp, 100);
        }
        for (cv, c) in self.input.communities.iter() {
            asg.set_bool(c, matches!(cv, CommunityVar::Exact(x) if communities.contains(x)));
        }
        self.propagate(asg)
    }

    fn propagate(&self, mut asg: PartialAssignment) -> PartialAssignment {
        asg.propagate(&self.ctx);
        asg
    }

    fn accepted(&self, asg: &PartialAssignment) -> Option<bool> {
        self.permitted.eval(asg)
    }

    fn out(&self, f: IntField, asg: &PartialAssignment) -> Option<i64> {
        self.output.int_attr(f).get().and_then(|x| x.eval(asg))
    }

    fn communities(&self, asg: &PartialAssignment) -> BTreeMap<Community, bool> {
        self.output
            .communities
            .iter()
            .filter_map(|(cv, c)| match cv {
                CommunityVar::Exact(x) => c.eval(asg).map(|b| (*x, b)),
                _ => None,
            })
            .collect()
    }
}

fn bgp_shape() -> RecordShape {
    RecordShape { local_pref: true, communities: true, ..Default::default() }
}

#[test]
fn branches_are_joined() {
    let conf = router(vec![RoutingPolicy::new(
        "MAIN",
        vec![branch(tagged(*C1), vec![local_pref(200)], vec![local_pref(50)]), Statement::ExitAccept],
    )]);
    let run = Run::new(&conf, Bgp, TransferKind::Import, Some("MAIN"), bgp_shape());

    let asg = run.bgp(&[*C1]);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.output.permitted.eval(&asg), Some(true));
    assert_eq!(run.out(IntField::LocalPref, &asg), Some(200));

    let asg = run.bgp(&[]);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.out(IntField::LocalPref, &asg), Some(50));

    let mut asg = PartialAssignment::new();
    asg.set_bool(&run.input.permitted, false);
    let asg = run.propagate(asg);
    assert_eq!(run.accepted(&asg), Some(false));
    assert_eq!(run.output.permitted.eval(&asg), Some(false));
}

#[test]
fn statements_after_return_have_no_effect() {
    let conf = router(vec![RoutingPolicy::new(
        "MAIN",
        vec![
            branch(tagged(*C1), vec![Statement::ExitAccept], vec![]),
            local_pref(300),
            Statement::ExitAccept,
        ],
    )]);
    let run = Run::new(&conf, Bgp, TransferKind::Import, Some("MAIN"), bgp_shape());

    let asg = run.bgp(&[*C1]);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.out(IntField::LocalPref, &asg), Some(100));

    let asg = run.bgp(&[]);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.out(IntField::LocalPref, &asg), Some(300));
}

#[test]
fn chain_falls_through_to_default_policy() {
    let first = RoutingPolicy::new(
        "FIRST",
        vec![branch(tagged(*C1), vec![Statement::ReturnFalse], vec![Statement::FallThrough])],
    );
    let default = RoutingPolicy::new("DEFAULT", vec![local_pref(150), Statement::ReturnTrue]);
    let chain = |name: &str, default_policy: bool| {
        let mut stmts = Vec::new();
        if default_policy {
            stmts.push(Statement::SetDefaultPolicy("DEFAULT".to_string()));
        }
        stmts.push(branch(
            BooleanExpr::ConjunctionChain(vec![BooleanExpr::CallExpr("FIRST".to_string())]),
            vec![Statement::ExitAccept],
            vec![Statement::ExitReject],
        ));
        RoutingPolicy::new(name, stmts)
    };
    let conf = router(vec![first, default, chain("MAIN", true), chain("PLAIN", false)]);

    let run = Run::new(&conf, Bgp, TransferKind::Import, Some("MAIN"), bgp_shape());
    // FIRST decides, the default policy is never executed
    let asg = run.bgp(&[*C1]);
    assert_eq!(run.accepted(&asg), Some(false));
    assert_eq!(run.output.permitted.eval(&asg), Some(false));
    // FIRST falls through, the default policy accepts and writes the local preference
    let asg = run.bgp(&[]);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.out(IntField::LocalPref, &asg), Some(150));

    // without a default policy, a conjunction chain that falls through is true
    let run = Run::new(&conf, Bgp, TransferKind::Import, Some("PLAIN"), bgp_shape());
    let asg = run.bgp(&[]);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.out(IntField::LocalPref, &asg), Some(100));
    let asg = run.bgp(&[*C1]);
    assert_eq!(run.accepted(&asg), Some(false));
}

#[test]
fn call_side_effects_respect_short_circuit() {
    let sub = RoutingPolicy::new("SUB", vec![local_pref(300), Statement::ReturnTrue]);
    let main = RoutingPolicy::new(
        "MAIN",
        vec![
            branch(
                BooleanExpr::Conjunction(vec![tagged(*C1), BooleanExpr::CallExpr("SUB".to_string())]),
                vec![],
                vec![],
            ),
            Statement::ExitAccept,
        ],
    );
    let conf = router(vec![sub, main]);
    let run = Run::new(&conf, Bgp, TransferKind::Import, Some("MAIN"), bgp_shape());

    let asg = run.bgp(&[*C1]);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.out(IntField::LocalPref, &asg), Some(300));

    // the call is skipped, and so is its write
    let asg = run.bgp(&[]);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.out(IntField::LocalPref, &asg), Some(100));
}

#[test]
fn skipped_call_cannot_exit() {
    let sub = RoutingPolicy::new("SUB", vec![Statement::ExitAccept]);
    let main = RoutingPolicy::new(
        "MAIN",
        vec![
            branch(
                BooleanExpr::Conjunction(vec![tagged(*C1), BooleanExpr::CallExpr("SUB".to_string())]),
                vec![],
                vec![],
            ),
            Statement::ExitReject,
        ],
    );
    let conf = router(vec![sub, main]);
    let run = Run::new(&conf, Bgp, TransferKind::Import, Some("MAIN"), bgp_shape());

    // the exit of SUB terminates MAIN
    let asg = run.bgp(&[*C1]);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.output.permitted.eval(&asg), Some(true));

    // SUB is never called, MAIN rejects
    let asg = run.bgp(&[]);
    assert_eq!(run.accepted(&asg), Some(false));
    assert_eq!(run.output.permitted.eval(&asg), Some(false));
}

#[test]
fn community_writes() {
    let lit = |cs: &[Community]| CommunitySetExpr::Literal(cs.to_vec());
    let conf = router(vec![
        RoutingPolicy::new("DELETE", vec![Statement::DeleteCommunity(lit(&[*C1])), Statement::ExitAccept]),
        RoutingPolicy::new("RETAIN", vec![Statement::RetainCommunity(lit(&[*C2])), Statement::ExitAccept]),
        RoutingPolicy::new("SET", vec![Statement::SetCommunity(lit(&[*C3])), Statement::ExitAccept]),
        RoutingPolicy::new("ADD", vec![Statement::AddCommunity(lit(&[*C3])), Statement::ExitAccept]),
    ]);
    let expected = btreemap! {
        "DELETE" => btreemap! {*C1 => false, *C2 => true, *C3 => false},
        "RETAIN" => btreemap! {*C1 => false, *C2 => true, *C3 => false},
        "SET" => btreemap! {*C1 => false, *C2 => false, *C3 => true},
        "ADD" => btreemap! {*C1 => true, *C2 => true, *C3 => true},
    };
    for (policy, communities) in expected {
        let run = Run::new(&conf, Bgp, TransferKind::Import, Some(policy), bgp_shape());
        let asg = run.bgp(&[*C1, *C2]);
        assert_eq!(run.accepted(&asg), Some(true), "{}", policy);
        assert_eq!(run.communities(&asg), communities, "{}", policy);
    }

    // communities are not sent to neighbors without send-community
    let kind =
        TransferKind::Export { ibgp: false, reflector: false, send_community: false, router_id: None, area: None };
    let run = Run::new(&conf, Bgp, kind, None, bgp_shape());
    let asg = run.bgp(&[*C1, *C2]);
    assert_eq!(run.communities(&asg), btreemap! {*C1 => false, *C2 => false, *C3 => false});
}

#[test]
fn ospf_area_crossing() {
    let conf = router(vec![]);
    let shape = RecordShape { metric: true, ospf_area: true, ospf_type: true, ..Default::default() };
    // (area, type) of the input, area of the link, type of the output
    let cases = [
        (0, OSPF_TYPE_O, 1, OSPF_TYPE_OIA),
        (1, OSPF_TYPE_O, 1, OSPF_TYPE_O),
        (0, OSPF_TYPE_OIA, 1, OSPF_TYPE_OIA),
        (0, OSPF_TYPE_E1, 1, OSPF_TYPE_E1),
        (2, OSPF_TYPE_E2, 1, OSPF_TYPE_E2),
    ];
    for (area, t, link, expected) in cases.iter().copied() {
        let run = Run::new(&conf, Ospf, export(false, false, Some(link)), None, shape);
        let mut asg = PartialAssignment::new();
        asg.set_bool(&run.input.permitted, true)
            .set_int(run.input.metric.get().unwrap(), 10)
            .set_int(run.input.ospf_area.get().unwrap(), area)
            .set_int(run.input.ospf_type.get().unwrap(), t);
        let asg = run.propagate(asg);
        assert_eq!(run.accepted(&asg), Some(true));
        assert_eq!(run.out(IntField::OspfArea, &asg), Some(link as i64));
        assert_eq!(run.out(IntField::OspfType, &asg), Some(expected), "{} {} -> {}", area, t, link);
        assert_eq!(run.out(IntField::Metric, &asg), Some(10));
    }
}

#[test]
fn protocol_match_uses_history() {
    let conf = router(vec![RoutingPolicy::new(
        "STATIC_ONLY",
        vec![branch(
            BooleanExpr::MatchProtocol(vec![Static]),
            vec![Statement::ExitAccept],
            vec![Statement::ExitReject],
        )],
    )]);
    let shape = RecordShape { history: true, ..Default::default() };
    let with_history = |run: &Run, p: Protocol| {
        let mut asg = PartialAssignment::new();
        asg.set_bool(&run.input.permitted, true).set_int(run.input.history.get().unwrap(), p.index());
        run.propagate(asg)
    };

    // an exported route remembers where it was redistributed from
    let run = Run::new(&conf, Bgp, export(false, false, None), Some("STATIC_ONLY"), shape);
    let asg = with_history(&run, Static);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.out(IntField::History, &asg), Some(Static.index()));
    assert_eq!(run.accepted(&with_history(&run, Bgp)), Some(false));
    assert_eq!(run.accepted(&with_history(&run, Connected)), Some(false));

    // redistribution overwrites the history with the source protocol
    let run = Run::new(&conf, Bgp, TransferKind::Redistribution { from: Static }, Some("STATIC_ONLY"), shape);
    let asg = with_history(&run, Bgp);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(run.out(IntField::History, &asg), Some(Static.index()));
    let run = Run::new(&conf, Bgp, TransferKind::Redistribution { from: Connected }, Some("STATIC_ONLY"), shape);
    assert_eq!(run.accepted(&with_history(&run, Static)), Some(false));

    // imports match the protocol of the edge
    let run = Run::new(&conf, Bgp, TransferKind::Import, Some("STATIC_ONLY"), shape);
    assert_eq!(run.accepted(&with_history(&run, Static)), Some(false));
}

#[test]
fn ibgp_routes_are_only_reflected() {
    let conf = router(vec![]);
    let shape = RecordShape { bgp_internal: true, ..Default::default() };
    let internal = |run: &Run, b: bool| {
        let mut asg = PartialAssignment::new();
        asg.set_bool(&run.input.permitted, true).set_bool(run.input.bgp_internal.get().unwrap(), b);
        run.propagate(asg)
    };
    let out_internal = |run: &Run, asg: &PartialAssignment| run.output.bgp_internal.get().unwrap().eval(asg);

    let run = Run::new(&conf, Bgp, export(true, false, None), None, shape);
    assert_eq!(run.accepted(&internal(&run, true)), Some(false));
    let asg = internal(&run, false);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(out_internal(&run, &asg), Some(true));

    let run = Run::new(&conf, Bgp, export(true, true, None), None, shape);
    assert_eq!(run.accepted(&internal(&run, true)), Some(true));

    // eBGP sessions take every route, and the neighbor learns it externally
    let run = Run::new(&conf, Bgp, export(false, false, None), None, shape);
    let asg = internal(&run, true);
    assert_eq!(run.accepted(&asg), Some(true));
    assert_eq!(out_internal(&run, &asg), Some(false));
}

#[cfg(feature = "z3")]
mod solver {
    use super::*;
    use crate::netconf::{Community, Prefix};

    fn unsat(ctx: &Context) -> bool {
        Z3Backend::new().solve(ctx, None).unwrap() == SolverOutput::Unsat
    }

    /// Import of r1 from its environment neighbor. Returns the context, the output local
    /// preference and the condition for the route to pass.
    fn community_import(tagged: bool) -> (Context, IntExpr, BoolExpr) {
        let net = BgpCommunityNet::net();
        let conf = net.config("r1").unwrap();
        let registry = CommunityRegistry::from_network(&net).unwrap();
        let tag = CommunityVar::Exact(Community::new(30, 1));
        assert!(registry.vars().any(|v| v == &tag));

        let shape = RecordShape { local_pref: true, metric: true, communities: true, ..Default::default() };
        let mut ctx = Context::new();
        let packet = SymbolicPacket::new(&mut ctx, "");
        let (input, output) = records(&mut ctx, &registry, Bgp, shape);
        let mut params = TransferParams::new("r1_BGP_IMPORT_eth0", Bgp, TransferKind::Import);
        params.policy = conf.routing_policies.get("IMPORT");
        let permitted = TransferFunction::new(&mut ctx, conf, &registry, &packet, params)
            .compute(&input, &output)
            .unwrap();
        ctx.add(input.permitted.clone());
        ctx.add(input.local_pref.get().unwrap().equals(&IntExpr::constant(100)));
        let has_tag = input.community(&tag);
        ctx.add(if tagged { has_tag } else { has_tag.not() });
        (ctx, output.local_pref.get().unwrap().clone(), permitted)
    }

    #[test]
    fn community_sets_local_pref() {
        // tagged routes are accepted with local preference 200
        let (mut ctx, lp, permitted) = community_import(true);
        ctx.add(permitted.not().or(&lp.equals(&IntExpr::constant(200)).not()));
        assert!(unsat(&ctx));

        // all other routes are accepted unchanged
        let (mut ctx, lp, permitted) = community_import(false);
        ctx.add(permitted.not().or(&lp.equals(&IntExpr::constant(100)).not()));
        assert!(unsat(&ctx));
    }

    /// Export of the static route `10.0.1.0/24` by r1. Returns the context and the output prefix
    /// length.
    fn aggregate_export() -> (Context, IntExpr) {
        let net = AggregateNet::net();
        let conf = net.config("r1").unwrap();
        let registry = CommunityRegistry::from_network(&net).unwrap();
        let aggregate: Prefix = "10.0.0.0/16".parse().unwrap();
        let specific: Prefix = "10.0.1.0/24".parse().unwrap();

        let mut ctx = Context::new();
        let packet = SymbolicPacket::new(&mut ctx, "");
        let (input, output) = records(&mut ctx, &registry, Bgp, metric_shape());
        let kind = TransferKind::Export {
            ibgp: false,
            reflector: false,
            send_community: true,
            router_id: None,
            area: None,
        };
        let mut params = TransferParams::new("r1_BGP_EXPORT", Bgp, kind);
        params.aggregates = vec![aggregate];
        TransferFunction::new(&mut ctx, conf, &registry, &packet, params)
            .compute(&input, &output)
            .unwrap();
        ctx.add(packet.dst_in(&specific));
        ctx.add(input.permitted.clone());
        ctx.add(input.prefix_length.get().unwrap().equals(&IntExpr::constant(24)));
        ctx.add(output.permitted.clone());
        (ctx, output.prefix_length.get().unwrap().clone())
    }

    #[test]
    fn aggregate_suppresses_more_specifics() {
        let (mut ctx, plen) = aggregate_export();
        ctx.add(plen.equals(&IntExpr::constant(24)));
        assert!(unsat(&ctx));

        let (mut ctx, plen) = aggregate_export();
        ctx.add(plen.equals(&IntExpr::constant(16)));
        assert!(!unsat(&ctx));
    }
}
