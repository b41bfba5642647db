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

//! # Transfer Function
//!
//! Symbolic interpretation of routing policies. A transfer function relates the record entering a
//! logical edge (the input) to the record leaving it (the output). The policy is interpreted on a
//! working copy of the input, in single static assignment form: the interpreter never changes the
//! value of a solver variable, but introduces a fresh one, constrained to be equal to a function of
//! the old value. Branches are interpreted on independent copies of the state and joined
//! afterwards with one `ite` per slot that differs.
//!
//! A statement only has an effect if no terminal statement was executed before on the same path,
//! and if no enclosing policy returned (the *block* condition). Terminal statements update the
//! return value only if no return happened before.

use super::community::{CommunityRegistry, CommunityVar};
use super::packet::SymbolicPacket;
use super::symbolic_route::{
    Attr, IntField, SymbolicRoute, DEFAULT_LOCAL_PREF, DEFAULT_OSPF_REDISTRIBUTION_METRIC,
    OSPF_TYPE_E1, OSPF_TYPE_E2, OSPF_TYPE_OIA,
};
use super::EncoderError;
use crate::netconf::{
    BooleanExpr, CommunityMatch, CommunitySetExpr, Configuration, IntComparator, OspfMetricType,
    Prefix, PrefixRange, PrefixSetExpr, Protocol, RoutingPolicy, Statement, ValueExpr,
};
use crate::smt::{BoolExpr, Context, IntExpr};

use log::*;

/// Direction of the transfer function, and the metadata of the edge it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferKind {
    /// Routes received from a neighbor or the environment
    Import,
    /// Routes sent to a neighbor
    Export {
        /// The BGP session is an iBGP session
        ibgp: bool,
        /// The router reflects iBGP routes to other iBGP peers
        reflector: bool,
        /// Communities are sent to the neighbor
        send_community: bool,
        /// Router id of the exporting router, written into the output
        router_id: Option<i64>,
        /// OSPF area of the link
        area: Option<u32>,
    },
    /// Best route of another protocol redistributed on the same router
    Redistribution {
        /// Protocol the route is taken from
        from: Protocol,
    },
}

/// Parameters of a transfer function
#[derive(Debug, Clone)]
pub struct TransferParams<'a> {
    /// Prefix of all fresh variables
    pub name: String,
    /// Protocol of the output record
    pub proto: Protocol,
    /// Direction and metadata
    pub kind: TransferKind,
    /// Policy applied to the route. `None` accepts every route unchanged.
    pub policy: Option<&'a RoutingPolicy>,
    /// Added to the metric
    pub cost: i64,
    /// Additional condition for the route to pass (for instance, the link did not fail)
    pub guard: BoolExpr,
    /// Aggregates suppressing more specific routes, least specific first
    pub aggregates: Vec<Prefix>,
}

impl<'a> TransferParams<'a> {
    /// Parameters of an import without policy, cost and guard.
    pub fn new(name: impl Into<String>, proto: Protocol, kind: TransferKind) -> Self {
        Self {
            name: name.into(),
            proto,
            kind,
            policy: None,
            cost: 0,
            guard: BoolExpr::tt(),
            aggregates: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallContext {
    Top,
    Expr,
    Statement,
}

#[derive(Debug, Clone)]
struct TransferState {
    data: SymbolicRoute,
    ret: BoolExpr,
    returned: BoolExpr,
    exited: BoolExpr,
    fallthrough: BoolExpr,
    default_accept: BoolExpr,
    default_local: BoolExpr,
    block: BoolExpr,
    call_context: CallContext,
    default_policy: Option<String>,
}

impl TransferState {
    fn blocked(&self) -> BoolExpr {
        self.block.or(&self.returned)
    }
}

/// # Transfer Function
/// See the [module documentation](self).
pub struct TransferFunction<'s, 'a> {
    ctx: &'s mut Context,
    conf: &'a Configuration,
    registry: &'s CommunityRegistry,
    packet: &'s SymbolicPacket,
    params: TransferParams<'a>,
    counter: usize,
    call_stack: Vec<String>,
}

impl<'s, 'a> TransferFunction<'s, 'a> {
    /// Create a new transfer function for a router
    pub fn new(
        ctx: &'s mut Context,
        conf: &'a Configuration,
        registry: &'s CommunityRegistry,
        packet: &'s SymbolicPacket,
        params: TransferParams<'a>,
    ) -> Self {
        Self { ctx, conf, registry, packet, params, counter: 0, call_stack: Vec::new() }
    }

    /// Interpret the policy, and relate the input to the output record. Returns the condition
    /// under which the output carries a route.
    pub fn compute(
        mut self,
        input: &SymbolicRoute,
        output: &SymbolicRoute,
    ) -> Result<BoolExpr, EncoderError> {
        let reflection_guard = match &self.params.kind {
            TransferKind::Export { ibgp: true, reflector: false, .. } => input.internal().not(),
            _ => BoolExpr::tt(),
        };
        let mut st = TransferState {
            data: self.initial_data(input, output),
            ret: BoolExpr::ff(),
            returned: BoolExpr::ff(),
            exited: BoolExpr::ff(),
            fallthrough: BoolExpr::ff(),
            default_accept: BoolExpr::ff(),
            default_local: BoolExpr::ff(),
            block: BoolExpr::ff(),
            call_context: CallContext::Top,
            default_policy: None,
        };
        let accepted = match self.params.policy {
            Some(policy) => {
                trace!("{}: interpreting policy {}", self.params.name, policy.name);
                self.call_stack.push(policy.name.clone());
                st = self.interpret(&policy.statements, st)?;
                self.call_stack.pop();
                let finished = st.returned.and(&st.fallthrough.not());
                finished.ite(&st.ret, &st.default_accept)
            }
            None => BoolExpr::tt(),
        };
        Ok(self.relate(&st, input, output, accepted.and(&reflection_guard)))
    }

    /// Working record: the shape of the output, with the values of the input, adjusted by the
    /// direction of the edge.
    fn initial_data(&self, input: &SymbolicRoute, output: &SymbolicRoute) -> SymbolicRoute {
        let mut data = output.clone();
        data.permitted = input.permitted.clone();
        for f in IntField::ALL.iter() {
            if output.int_attr(*f).is_present() {
                data.set_int_attr(*f, Attr::Present(input.value(*f)));
            }
        }
        if data.bgp_internal.is_present() {
            data.bgp_internal = Attr::Present(input.internal());
        }
        for (cv, c) in data.communities.iter_mut() {
            *c = input.community(cv);
        }

        let c = IntExpr::constant;
        match (&self.params.kind, self.params.proto) {
            (TransferKind::Export { ibgp, .. }, Protocol::Bgp) => {
                let admin = if *ibgp { Protocol::IBGP_ADMIN_DISTANCE } else { Protocol::Bgp.default_admin_distance() };
                data.overwrite(IntField::AdminDist, c(admin));
                if !*ibgp {
                    data.overwrite(IntField::LocalPref, c(DEFAULT_LOCAL_PREF));
                }
                if data.bgp_internal.is_present() {
                    data.bgp_internal = Attr::Present(BoolExpr::constant(*ibgp));
                }
                if !self.params.aggregates.is_empty() {
                    let plen = data.value(IntField::PrefixLength);
                    let aggregated = self.params.aggregates.iter().fold(plen.clone(), |acc, agg| {
                        let len = c(agg.len() as i64);
                        self.packet.dst_in(agg).and(&plen.gt(&len)).ite_int(&len, &acc)
                    });
                    data.set_int_attr(IntField::PrefixLength, Attr::Present(aggregated));
                }
            }
            (TransferKind::Export { .. }, Protocol::Ospf) => {
                data.overwrite(IntField::AdminDist, c(Protocol::Ospf.default_admin_distance()));
            }
            (TransferKind::Redistribution { from }, proto) => {
                data.overwrite(IntField::History, c(from.index()));
                data.overwrite(IntField::AdminDist, c(proto.default_admin_distance()));
                let metric = if proto == Protocol::Ospf { DEFAULT_OSPF_REDISTRIBUTION_METRIC } else { 0 };
                data.overwrite(IntField::Metric, c(metric));
                data.overwrite(IntField::LocalPref, c(DEFAULT_LOCAL_PREF));
                data.overwrite(IntField::Med, c(0));
                data.overwrite(IntField::RouterId, c(0));
                data.overwrite(IntField::OspfArea, c(0));
                data.overwrite(IntField::OspfType, c(OSPF_TYPE_E2));
                if data.bgp_internal.is_present() {
                    data.bgp_internal = Attr::Present(BoolExpr::ff());
                }
            }
            _ => {}
        }
        data
    }

    /// Relate the working record to the output record
    fn relate(
        &mut self,
        st: &TransferState,
        input: &SymbolicRoute,
        output: &SymbolicRoute,
        accepted: BoolExpr,
    ) -> BoolExpr {
        let metric = st.data.value(IntField::Metric);
        let new_metric = if self.params.cost != 0 { metric.add_const(self.params.cost) } else { metric };

        let mut conds = vec![input.permitted.clone(), accepted, self.params.guard.clone()];
        if output.metric.is_present() {
            conds.push(new_metric.gt(&IntExpr::constant(self.params.proto.max_metric())).not());
        }
        let permitted = BoolExpr::and_all(conds);

        let (router_id, area, send_community) = match &self.params.kind {
            TransferKind::Export { router_id, area, send_community, .. } => {
                (*router_id, *area, *send_community)
            }
            _ => (None, None, true),
        };

        let mut eqs = vec![output.permitted.clone()];
        for f in IntField::ALL.iter() {
            let out = match output.int_attr(*f) {
                Attr::Present(x) => x,
                Attr::Elided => continue,
            };
            let value = match (f, router_id, area) {
                (IntField::Metric, _, _) => new_metric.clone(),
                (IntField::RouterId, Some(id), _) => IntExpr::constant(id),
                (IntField::OspfArea, _, Some(a)) => IntExpr::constant(a as i64),
                (IntField::OspfType, _, Some(a)) => ospf_type_across(&st.data, a),
                _ => st.data.value(*f),
            };
            eqs.push(out.equals(&value));
        }
        if let Attr::Present(b) = &output.bgp_internal {
            eqs.push(b.iff(&st.data.internal()));
        }
        for (cv, c) in output.communities.iter().filter(|(cv, _)| !cv.is_regex()) {
            let value = if send_community { st.data.community(cv) } else { BoolExpr::ff() };
            eqs.push(c.iff(&value));
        }

        self.ctx.add(permitted.ite(&BoolExpr::and_all(eqs), &output.permitted.not()));
        permitted
    }

    fn fresh_name(&mut self, label: &str) -> String {
        self.counter += 1;
        format!("{}_{}_{}", self.params.name, label, self.counter)
    }

    /// Introduce a fresh variable equal to the term, unless the term is a constant or a variable.
    fn bind_bool(&mut self, label: &str, e: BoolExpr) -> BoolExpr {
        if e.as_const().is_some() || e.as_var().is_some() {
            return e;
        }
        let name = self.fresh_name(label);
        let v = self.ctx.bool_var(&name);
        self.ctx.add(v.iff(&e));
        v
    }

    fn bind_int(&mut self, label: &str, e: IntExpr) -> IntExpr {
        if e.as_const().is_some() || e.as_var().is_some() {
            return e;
        }
        let name = self.fresh_name(label);
        let v = self.ctx.int_var(&name);
        self.ctx.add(v.equals(&e));
        v
    }

    fn interpret(
        &mut self,
        stmts: &'a [Statement],
        mut st: TransferState,
    ) -> Result<TransferState, EncoderError> {
        for s in stmts {
            st = self.statement(s, st)?;
        }
        Ok(st)
    }

    fn statement(
        &mut self,
        s: &'a Statement,
        mut st: TransferState,
    ) -> Result<TransferState, EncoderError> {
        if st.blocked().is_true() {
            return Ok(st);
        }
        match s {
            Statement::If { guard, true_statements, false_statements } => {
                let (g, st) = self.expr(guard, st)?;
                return match g.as_const() {
                    Some(true) => self.interpret(true_statements, st),
                    Some(false) => self.interpret(false_statements, st),
                    None => {
                        let t = self.interpret(true_statements, st.clone())?;
                        let f = self.interpret(false_statements, st)?;
                        Ok(self.join(&g, t, f))
                    }
                };
            }
            Statement::SetLocalPreference(v) => self.assign(&mut st, IntField::LocalPref, v),
            Statement::SetMetric(v) => {
                let f = self.metric_field();
                self.assign(&mut st, f, v)
            }
            Statement::SetMed(v) => self.assign(&mut st, IntField::Med, v),
            Statement::SetAdministrativeCost(v) => self.assign(&mut st, IntField::AdminDist, v),
            Statement::SetOspfMetricType(t) => {
                let value = match t {
                    OspfMetricType::E1 => OSPF_TYPE_E1,
                    OspfMetricType::E2 => OSPF_TYPE_E2,
                };
                self.assign_int(&mut st, IntField::OspfType, IntExpr::constant(value))
            }
            Statement::PrependAsPath(n) => {
                if self.params.proto == Protocol::Bgp {
                    let new = st.data.value(IntField::Metric).add_const(*n as i64);
                    self.assign_int(&mut st, IntField::Metric, new)
                }
            }
            Statement::AddCommunity(set) => {
                for cv in self.resolve(set)? {
                    if let CommunityVar::Exact(_) = cv {
                        self.assign_community(&mut st, &cv, true);
                    }
                }
            }
            Statement::DeleteCommunity(set) => {
                for cv in self.resolve(set)? {
                    self.assign_community(&mut st, &cv, false);
                }
            }
            Statement::RetainCommunity(set) => {
                let keep = self.resolve(set)?;
                let drop: Vec<CommunityVar> = st
                    .data
                    .communities
                    .keys()
                    .filter(|cv| !cv.is_regex() && !keep.contains(cv))
                    .cloned()
                    .collect();
                for cv in drop {
                    self.assign_community(&mut st, &cv, false);
                }
            }
            Statement::SetCommunity(set) => {
                let keep = self.resolve(set)?;
                let all: Vec<CommunityVar> =
                    st.data.communities.keys().filter(|cv| !cv.is_regex()).cloned().collect();
                for cv in all {
                    let value = matches!(cv, CommunityVar::Exact(_)) && keep.contains(&cv);
                    self.assign_community(&mut st, &cv, value);
                }
            }
            Statement::ExitAccept => self.terminate(&mut st, BoolExpr::tt(), true),
            Statement::ExitReject => self.terminate(&mut st, BoolExpr::ff(), true),
            Statement::ReturnTrue => self.terminate(&mut st, BoolExpr::tt(), false),
            Statement::ReturnFalse => self.terminate(&mut st, BoolExpr::ff(), false),
            Statement::ReturnLocalDefaultAction => {
                let value = st.default_local.clone();
                self.terminate(&mut st, value, false)
            }
            Statement::FallThrough => {
                let blocked = st.blocked();
                st.fallthrough = self.bind_bool("FALLTHROUGH", blocked.ite(&st.fallthrough, &BoolExpr::tt()));
                st.returned = self.bind_bool("RETURNED", st.returned.or(&st.block.not()));
            }
            Statement::SetDefaultActionAccept | Statement::SetDefaultActionReject => {
                let value = BoolExpr::constant(matches!(s, Statement::SetDefaultActionAccept));
                st.default_accept =
                    self.bind_bool("DEFAULT", st.blocked().ite(&st.default_accept, &value));
            }
            Statement::SetLocalDefaultActionAccept | Statement::SetLocalDefaultActionReject => {
                let value = BoolExpr::constant(matches!(s, Statement::SetLocalDefaultActionAccept));
                st.default_local =
                    self.bind_bool("LOCAL_DEFAULT", st.blocked().ite(&st.default_local, &value));
            }
            Statement::SetDefaultPolicy(name) => st.default_policy = Some(name.clone()),
            Statement::CallStatement(name) => {
                let (_, _, out) = self.call(name, st, CallContext::Statement)?;
                st = out;
            }
            Statement::Comment(_) => {}
            Statement::Unsupported(x) => return Err(EncoderError::UnsupportedStatement(x.clone())),
        }
        Ok(st)
    }

    fn expr(
        &mut self,
        e: &'a BooleanExpr,
        st: TransferState,
    ) -> Result<(BoolExpr, TransferState), EncoderError> {
        Ok(match e {
            BooleanExpr::True => (BoolExpr::tt(), st),
            BooleanExpr::False => (BoolExpr::ff(), st),
            BooleanExpr::Not(x) => {
                let (v, st) = self.expr(x, st)?;
                (v.not(), st)
            }
            BooleanExpr::Conjunction(xs) | BooleanExpr::Disjunction(xs) => {
                let conjunction = matches!(e, BooleanExpr::Conjunction(_));
                let saved = st.block.clone();
                let mut st = st;
                let mut acc = BoolExpr::constant(conjunction);
                for x in xs {
                    // evaluation stops at the first decisive operand
                    let stop = if conjunction { acc.not() } else { acc.clone() };
                    st.block = saved.or(&stop);
                    let (v, s) = self.expr(x, st)?;
                    st = s;
                    acc = if conjunction { acc.and(&v) } else { acc.or(&v) };
                }
                st.block = saved;
                (acc, st)
            }
            BooleanExpr::ConjunctionChain(xs) => self.chain(xs, st, true)?,
            BooleanExpr::DisjunctionChain(xs) => self.chain(xs, st, false)?,
            BooleanExpr::MatchProtocol(ps) => (self.match_protocol(&st, ps), st),
            BooleanExpr::MatchPrefixSet(set) => (self.match_prefix_set(&st, set)?, st),
            BooleanExpr::MatchCommunitySet(set) => (self.match_community_set(&st, set)?, st),
            BooleanExpr::MatchLocalPreference(cmp, v) => {
                (compare(&st.data.value(IntField::LocalPref), *cmp, *v), st)
            }
            BooleanExpr::MatchMetric(cmp, v) => {
                (compare(&st.data.value(self.metric_field()), *cmp, *v), st)
            }
            BooleanExpr::CallExpr(name) => {
                let (v, _, st) = self.call(name, st, CallContext::Expr)?;
                (v, st)
            }
            BooleanExpr::CallExprContext => {
                (BoolExpr::constant(st.call_context == CallContext::Expr), st)
            }
            BooleanExpr::CallStatementContext => {
                (BoolExpr::constant(st.call_context == CallContext::Statement), st)
            }
            BooleanExpr::Unsupported(x) => return Err(EncoderError::UnsupportedExpression(x.clone())),
        })
    }

    /// Chains of policies. Policies falling through pass on to the next one; the chain stops at
    /// the first decisive result, and otherwise the default policy decides.
    fn chain(
        &mut self,
        xs: &'a [BooleanExpr],
        st: TransferState,
        conjunction: bool,
    ) -> Result<(BoolExpr, TransferState), EncoderError> {
        let saved = st.block.clone();
        let mut st = st;
        let mut stopped = BoolExpr::ff();
        for x in xs {
            st.block = saved.or(&stopped);
            let (v, fell, s) = match x {
                BooleanExpr::CallExpr(name) => self.call(name, st, CallContext::Expr)?,
                other => {
                    let (v, s) = self.expr(other, st)?;
                    (v, BoolExpr::ff(), s)
                }
            };
            st = s;
            let decisive = if conjunction { v.not() } else { v };
            stopped = self.bind_bool("CHAIN", stopped.or(&fell.not().and(&decisive)));
        }
        st.block = saved.or(&stopped);
        let default = match st.default_policy.clone() {
            Some(name) => {
                let (v, _, s) = self.call(&name, st, CallContext::Expr)?;
                st = s;
                v
            }
            None => BoolExpr::constant(conjunction),
        };
        st.block = saved;
        let value = if conjunction { stopped.not().and(&default) } else { stopped.or(&default) };
        Ok((value, st))
    }

    /// Call another policy. Returns the value of the call, whether it fell through, and the state
    /// after the call.
    fn call(
        &mut self,
        name: &str,
        st: TransferState,
        context: CallContext,
    ) -> Result<(BoolExpr, BoolExpr, TransferState), EncoderError> {
        let conf = self.conf;
        let policy = conf.routing_policies.get(name).ok_or_else(|| {
            EncoderError::UndefinedPolicy(conf.hostname.clone(), name.to_string())
        })?;
        if self.call_stack.iter().any(|n| n == name) {
            return Err(EncoderError::RecursivePolicy(name.to_string()));
        }
        self.call_stack.push(name.to_string());
        let mut sub = st.clone();
        sub.block = st.blocked();
        sub.ret = BoolExpr::ff();
        sub.returned = BoolExpr::ff();
        sub.exited = BoolExpr::ff();
        sub.fallthrough = BoolExpr::ff();
        sub.default_local = st.default_accept.clone();
        sub.call_context = context;
        sub.default_policy = None;
        let sub = self.interpret(&policy.statements, sub)?;
        self.call_stack.pop();

        let finished = sub.returned.and(&sub.fallthrough.not());
        let value = self.bind_bool("CALL", finished.ite(&sub.ret, &sub.default_local));
        let fell = sub.fallthrough.clone();
        let mut out = st;
        out.data = sub.data;
        out.default_accept = sub.default_accept;
        if !sub.exited.is_false() {
            // an exit inside the callee terminates the caller as well
            let exits = out.blocked().not().and(&sub.exited);
            out.ret = self.bind_bool("RETURN", exits.ite(&sub.ret, &out.ret));
            out.exited = self.bind_bool("EXITED", out.exited.or(&exits));
            out.returned = self.bind_bool("RETURNED", out.returned.or(&exits));
        }
        Ok((value, fell, out))
    }

    fn join(&mut self, guard: &BoolExpr, t: TransferState, f: TransferState) -> TransferState {
        let mut out = t.clone();
        out.ret = self.join_bool("RETURN", guard, &t.ret, &f.ret);
        out.returned = self.join_bool("RETURNED", guard, &t.returned, &f.returned);
        out.exited = self.join_bool("EXITED", guard, &t.exited, &f.exited);
        out.fallthrough = self.join_bool("FALLTHROUGH", guard, &t.fallthrough, &f.fallthrough);
        out.default_accept = self.join_bool("DEFAULT", guard, &t.default_accept, &f.default_accept);
        out.default_local = self.join_bool("LOCAL_DEFAULT", guard, &t.default_local, &f.default_local);
        for field in IntField::ALL.iter() {
            if let (Attr::Present(a), Attr::Present(b)) = (t.data.int_attr(*field), f.data.int_attr(*field)) {
                let v = if a.same(b) {
                    a.clone()
                } else {
                    self.bind_int(field.label(), guard.ite_int(a, b))
                };
                out.data.set_int_attr(*field, Attr::Present(v));
            }
        }
        if let (Attr::Present(a), Attr::Present(b)) = (&t.data.bgp_internal, &f.data.bgp_internal) {
            out.data.bgp_internal = Attr::Present(self.join_bool("bgpInternal", guard, a, b));
        }
        for (cv, a) in t.data.communities.iter() {
            let b = f.data.community(cv);
            let v = self.join_bool(&cv.name(), guard, a, &b);
            out.data.communities.insert(cv.clone(), v);
        }
        if t.default_policy != f.default_policy {
            warn!("{}: branches set different default policies", self.params.name);
            out.default_policy = t.default_policy.or(f.default_policy);
        }
        out
    }

    fn join_bool(&mut self, label: &str, guard: &BoolExpr, a: &BoolExpr, b: &BoolExpr) -> BoolExpr {
        if a.same(b) {
            a.clone()
        } else {
            self.bind_bool(label, guard.ite(a, b))
        }
    }

    /// Return from the current policy with `value`, unless the state is blocked. A blocked state
    /// keeps its previous return value and stays unreturned.
    fn terminate(&mut self, st: &mut TransferState, value: BoolExpr, exit: bool) {
        let blocked = st.blocked();
        st.ret = self.bind_bool("RETURN", blocked.ite(&st.ret, &value));
        if exit {
            st.exited = self.bind_bool("EXITED", blocked.ite(&st.exited, &BoolExpr::tt()));
        }
        st.returned = self.bind_bool("RETURNED", st.returned.or(&st.block.not()));
    }

    fn assign(&mut self, st: &mut TransferState, f: IntField, v: &ValueExpr) {
        let new = match v {
            ValueExpr::Literal(x) => IntExpr::constant(*x as i64),
            ValueExpr::Increment(x) => st.data.value(f).add_const(*x as i64),
            ValueExpr::Decrement(x) => st.data.value(f).add_const(-(*x as i64)),
        };
        self.assign_int(st, f, new)
    }

    fn assign_int(&mut self, st: &mut TransferState, f: IntField, new: IntExpr) {
        let old = match st.data.int_attr(f) {
            Attr::Present(x) => x.clone(),
            Attr::Elided => {
                debug!("{}: {} is not encoded, ignoring the write", self.params.name, f.label());
                return;
            }
        };
        let v = self.bind_int(f.label(), st.blocked().ite_int(&old, &new));
        st.data.set_int_attr(f, Attr::Present(v));
    }

    fn assign_community(&mut self, st: &mut TransferState, cv: &CommunityVar, new: bool) {
        let old = match st.data.communities.get(cv) {
            Some(c) => c.clone(),
            None => return,
        };
        let v = self.bind_bool(&cv.name(), st.blocked().ite(&old, &BoolExpr::constant(new)));
        st.data.communities.insert(cv.clone(), v);
    }

    /// For BGP, the metric of a policy is the MED.
    fn metric_field(&self) -> IntField {
        if self.params.proto == Protocol::Bgp {
            IntField::Med
        } else {
            IntField::Metric
        }
    }

    fn resolve(&self, set: &CommunitySetExpr) -> Result<Vec<CommunityVar>, EncoderError> {
        self.registry.resolve_write(self.conf, set).ok_or_else(|| match set {
            CommunitySetExpr::Named(n) => {
                EncoderError::UndefinedCommunityList(self.conf.hostname.clone(), n.clone())
            }
            CommunitySetExpr::Literal(_) => {
                EncoderError::UndefinedCommunityList(self.conf.hostname.clone(), String::new())
            }
        })
    }

    fn match_protocol(&self, st: &TransferState, ps: &[Protocol]) -> BoolExpr {
        let native = match self.params.kind {
            TransferKind::Redistribution { from } => from,
            _ => self.params.proto,
        };
        match (&self.params.kind, &st.data.history) {
            (TransferKind::Import, _) | (_, Attr::Elided) => BoolExpr::constant(ps.contains(&native)),
            (_, Attr::Present(h)) => {
                BoolExpr::or_all(ps.iter().map(|p| h.equals(&IntExpr::constant(p.index()))))
            }
        }
    }

    fn match_prefix_set(
        &self,
        st: &TransferState,
        set: &PrefixSetExpr,
    ) -> Result<BoolExpr, EncoderError> {
        let plen = st.data.value(IntField::PrefixLength);
        let range = |r: &PrefixRange| {
            let lo = r.lengths.start.max(r.prefix.len() as i64);
            self.packet.dst_in(&r.prefix).and(&plen.in_range(lo, r.lengths.end))
        };
        Ok(match set {
            PrefixSetExpr::Explicit(ranges) => BoolExpr::or_all(ranges.iter().map(range)),
            PrefixSetExpr::Named(n) => {
                let list = self.conf.route_filter_lists.get(n).ok_or_else(|| {
                    EncoderError::UndefinedRouteFilterList(self.conf.hostname.clone(), n.clone())
                })?;
                list.lines.iter().rev().fold(BoolExpr::ff(), |acc, line| {
                    range(&line.range).ite(&BoolExpr::constant(line.action.is_permit()), &acc)
                })
            }
        })
    }

    fn match_community_set(
        &self,
        st: &TransferState,
        set: &CommunitySetExpr,
    ) -> Result<BoolExpr, EncoderError> {
        Ok(match set {
            CommunitySetExpr::Literal(cs) => BoolExpr::or_all(
                cs.iter().map(|c| st.data.community(&CommunityVar::Exact(*c))),
            ),
            CommunitySetExpr::Named(n) => {
                let list = self.conf.community_lists.get(n).ok_or_else(|| {
                    EncoderError::UndefinedCommunityList(self.conf.hostname.clone(), n.clone())
                })?;
                list.lines.iter().rev().fold(BoolExpr::ff(), |acc, line| {
                    let m = match &line.matcher {
                        CommunityMatch::Exact(c) => st.data.community(&CommunityVar::Exact(*c)),
                        CommunityMatch::Regex(r) => BoolExpr::or_all(
                            self.registry.dependencies(r).iter().map(|d| st.data.community(d)),
                        ),
                    };
                    m.ite(&BoolExpr::constant(line.action.is_permit()), &acc)
                })
            }
        })
    }
}

fn compare(x: &IntExpr, cmp: IntComparator, v: u32) -> BoolExpr {
    let v = IntExpr::constant(v as i64);
    match cmp {
        IntComparator::Eq => x.equals(&v),
        IntComparator::Ge => x.ge(&v),
        IntComparator::Gt => x.gt(&v),
        IntComparator::Le => x.le(&v),
        IntComparator::Lt => x.lt(&v),
    }
}

/// OSPF type of a route sent into an area: intra-area routes become inter-area routes when they
/// cross an area boundary, external routes keep their type.
fn ospf_type_across(data: &SymbolicRoute, area: u32) -> IntExpr {
    let t = data.value(IntField::OspfType);
    match &data.ospf_area {
        Attr::Present(current) => {
            let external = t.ge(&IntExpr::constant(OSPF_TYPE_E1));
            let same = current.equals(&IntExpr::constant(area as i64));
            external.or(&same).ite_int(&t, &IntExpr::constant(OSPF_TYPE_OIA))
        }
        Attr::Elided => t,
    }
}
