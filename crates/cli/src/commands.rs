//! CLI commands

use gcdex_core::{Address, TokenAmount};
use gcdex_exchange::OrderId;
use gcdex_projection::{DecoratedOrder, OrderSide, OrderView};
use gcdex_runtime::{Call, DeployConfig, Receipt};

use crate::context::AppContext;

/// Which order list to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderFilter {
    All,
    Open,
    Filled,
    Cancelled,
}

/// Deploy every configured token and the exchange
pub async fn deploy(ctx: &mut AppContext, config: &DeployConfig) -> Result<(), anyhow::Error> {
    if ctx.is_deployed() {
        anyhow::bail!(
            "Exchange already deployed at {}",
            ctx.runtime.exchange()?.address()
        );
    }

    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
    for tx in config.transactions(now) {
        let label = match &tx.call {
            Call::DeployToken { config } => format!("{} ({})", config.name, config.symbol),
            _ => "Exchange".to_string(),
        };
        let receipt = ctx.commit_at(tx.sender, tx.timestamp, tx.call).await?;
        if let Some(address) = receipt.contract {
            println!("✅ {label} deployed at {address}");
        }
    }

    println!(
        "   Fee account: {} ({}%)",
        config.fee_account_address(),
        config.fee_percent
    );
    Ok(())
}

/// Transfer tokens on the token ledger
pub async fn transfer(
    ctx: &mut AppContext,
    from: &str,
    to: &str,
    amount: &str,
    symbol: &str,
) -> Result<(), anyhow::Error> {
    let token = ctx.token(symbol)?;
    let (address, amount) = (token.address(), ctx.amount(token, amount)?);
    let (from, to) = (ctx.account(from), ctx.account(to));

    let receipt = ctx
        .commit(from, Call::Transfer { token: address, to, amount })
        .await?;

    println!(
        "✅ Transferred {} {} from {} to {} (tx: {})",
        ctx.format(&address, amount),
        ctx.symbol(&address),
        from.short(),
        to.short(),
        receipt.index
    );
    Ok(())
}

/// Allow `spender` (default: the exchange) to move `owner`'s tokens
pub async fn approve(
    ctx: &mut AppContext,
    owner: &str,
    spender: Option<&str>,
    amount: &str,
    symbol: &str,
) -> Result<(), anyhow::Error> {
    let token = ctx.token(symbol)?;
    let (address, amount) = (token.address(), ctx.amount(token, amount)?);
    let owner = ctx.account(owner);
    let spender = match spender {
        Some(name) => ctx.account(name),
        None => ctx.runtime.exchange()?.address(),
    };

    ctx.commit(owner, Call::Approve { token: address, spender, amount })
        .await?;

    println!(
        "✅ {} approved {} {} for {}",
        owner.short(),
        ctx.format(&address, amount),
        ctx.symbol(&address),
        spender.short()
    );
    Ok(())
}

/// Move tokens into exchange custody
pub async fn deposit(ctx: &mut AppContext, user: &str, amount: &str, symbol: &str) -> Result<(), anyhow::Error> {
    let token = ctx.token(symbol)?;
    let (address, amount) = (token.address(), ctx.amount(token, amount)?);
    let user = ctx.account(user);

    ctx.commit(user, Call::DepositToken { token: address, amount })
        .await?;

    let balance = ctx.runtime.exchange()?.balance_of(&address, &user);
    println!(
        "✅ Deposited {} {} for {} (exchange balance: {})",
        ctx.format(&address, amount),
        ctx.symbol(&address),
        user.short(),
        ctx.format(&address, balance)
    );
    Ok(())
}

/// Move tokens out of exchange custody
pub async fn withdraw(ctx: &mut AppContext, user: &str, amount: &str, symbol: &str) -> Result<(), anyhow::Error> {
    let token = ctx.token(symbol)?;
    let (address, amount) = (token.address(), ctx.amount(token, amount)?);
    let user = ctx.account(user);

    ctx.commit(user, Call::WithdrawToken { token: address, amount })
        .await?;

    let balance = ctx.runtime.exchange()?.balance_of(&address, &user);
    println!(
        "✅ Withdrew {} {} for {} (exchange balance: {})",
        ctx.format(&address, amount),
        ctx.symbol(&address),
        user.short(),
        ctx.format(&address, balance)
    );
    Ok(())
}

/// Create an order offering `give` for `get`
pub async fn make_order(
    ctx: &mut AppContext,
    user: &str,
    get: (&str, &str),
    give: (&str, &str),
) -> Result<OrderId, anyhow::Error> {
    let token_get = ctx.token(get.1)?;
    let (token_get, amount_get) = (token_get.address(), ctx.amount(token_get, get.0)?);
    let token_give = ctx.token(give.1)?;
    let (token_give, amount_give) = (token_give.address(), ctx.amount(token_give, give.0)?);
    let user = ctx.account(user);

    let receipt = ctx
        .commit(
            user,
            Call::MakeOrder {
                token_get,
                amount_get,
                token_give,
                amount_give,
            },
        )
        .await?;
    let id = order_id(&receipt)?;

    println!(
        "✅ Order #{id} by {}: give {} {} for {} {}",
        user.short(),
        ctx.format(&token_give, amount_give),
        ctx.symbol(&token_give),
        ctx.format(&token_get, amount_get),
        ctx.symbol(&token_get)
    );
    Ok(id)
}

/// Cancel one of `user`'s open orders
pub async fn cancel(ctx: &mut AppContext, user: &str, id: OrderId) -> Result<(), anyhow::Error> {
    let user = ctx.account(user);
    ctx.commit(user, Call::CancelOrder { id }).await?;
    println!("✅ Order #{id} cancelled by {}", user.short());
    Ok(())
}

/// Fill an open order as `user`
pub async fn fill(ctx: &mut AppContext, user: &str, id: OrderId) -> Result<(), anyhow::Error> {
    let user = ctx.account(user);
    ctx.commit(user, Call::FillOrder { id }).await?;

    let exchange = ctx.runtime.exchange()?;
    let order = exchange
        .order(id)
        .ok_or_else(|| anyhow::anyhow!("Order #{id} missing after fill"))?;
    let fee = exchange.fee_for(order.amount_get)?;
    println!(
        "✅ Order #{id} filled by {}: paid {} {} (fee {}), received {} {}",
        user.short(),
        ctx.format(&order.token_get, order.amount_get),
        ctx.symbol(&order.token_get),
        ctx.format(&order.token_get, fee),
        ctx.format(&order.token_give, order.amount_give),
        ctx.symbol(&order.token_give)
    );
    Ok(())
}

/// Wallet and exchange balances of `user` for every token
pub async fn balance(ctx: &AppContext, user: &str) -> Result<(), anyhow::Error> {
    let user = ctx.account(user);
    let exchange = ctx.runtime.exchange().ok();

    println!("Balances for {user}:");
    println!("{:<8} {:>24} {:>24}", "Token", "Wallet", "Exchange");
    println!("{}", "-".repeat(58));
    for token in ctx.runtime.tokens().iter() {
        let address = token.address();
        let custodied = exchange
            .map(|e| e.balance_of(&address, &user))
            .unwrap_or(TokenAmount::ZERO);
        println!(
            "{:<8} {:>24} {:>24}",
            token.symbol(),
            ctx.format(&address, token.balance_of(&user)),
            ctx.format(&address, custodied)
        );
    }
    Ok(())
}

/// List orders from the projection
pub async fn orders(ctx: &AppContext, filter: OrderFilter, user: Option<&str>) -> Result<(), anyhow::Error> {
    let projection = ctx.projection()?;
    let user = user.map(|u| ctx.account(u));

    let orders = match (filter, user) {
        (OrderFilter::Open, Some(user)) => projection.user_open_orders(&user).await?,
        (OrderFilter::Filled, Some(user)) => projection.user_trades(&user).await?,
        (OrderFilter::All, _) => projection.all_orders().await?,
        (OrderFilter::Open, None) => projection.open_orders().await?,
        (OrderFilter::Filled, None) => projection.filled_orders().await?,
        (OrderFilter::Cancelled, _) => projection.cancelled_orders().await?,
    };
    let orders: Vec<OrderView> = match (filter, user) {
        (OrderFilter::All | OrderFilter::Cancelled, Some(user)) => {
            orders.into_iter().filter(|o| o.involves(&user)).collect()
        }
        _ => orders,
    };

    if orders.is_empty() {
        println!("No orders");
        return Ok(());
    }

    println!(
        "{:>5} {:<14} {:>20} {:<6} {:>20} {:<6} {:<10}",
        "ID", "Creator", "Give", "", "Get", "", "Status"
    );
    println!("{}", "-".repeat(88));
    for order in &orders {
        println!(
            "{:>5} {:<14} {:>20} {:<6} {:>20} {:<6} {:<10}",
            order.id,
            order.user.short(),
            ctx.format(&order.token_give, order.amount_give),
            ctx.symbol(&order.token_give),
            ctx.format(&order.token_get, order.amount_get),
            ctx.symbol(&order.token_get),
            order.status
        );
    }
    println!("\nTotal: {} orders", orders.len());
    Ok(())
}

fn print_book_side(title: &str, orders: &[DecoratedOrder]) {
    println!("{title}");
    if orders.is_empty() {
        println!("   (empty)");
        return;
    }
    for order in orders {
        let price = order
            .price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   #{:<5} {:>20} {:>20} @ {}",
            order.order.id, order.token0_amount, order.token1_amount, price
        );
    }
}

/// Order book of the `base`/`quote` market
pub async fn book(ctx: &AppContext, base: &str, quote: &str) -> Result<(), anyhow::Error> {
    let token0 = ctx.token(base)?.address();
    let token1 = ctx.token(quote)?.address();
    let book = ctx.projection()?.order_book(token0, token1).await?;

    println!("Order book {}/{}", ctx.symbol(&token0), ctx.symbol(&token1));
    print_book_side("Sell orders:", &book.sell_orders);
    print_book_side("Buy orders:", &book.buy_orders);
    Ok(())
}

/// Trade history of the `base`/`quote` market, optionally for one user
pub async fn trades(ctx: &AppContext, base: &str, quote: &str, user: Option<&str>, limit: usize) -> Result<(), anyhow::Error> {
    let token0 = ctx.token(base)?.address();
    let token1 = ctx.token(quote)?.address();
    let projection = ctx.projection()?;

    println!("Trades {}/{}", ctx.symbol(&token0), ctx.symbol(&token1));
    match user {
        Some(user) => {
            let user = ctx.account(user);
            let trades = projection.user_pair_trades(token0, token1, &user).await?;
            for trade in trades.iter().take(limit) {
                let sign = match trade.side {
                    OrderSide::Buy => "+",
                    OrderSide::Sell => "-",
                };
                println!(
                    "   #{:<5} {:<4} {}{} @ {}",
                    trade.order.id,
                    trade.side,
                    sign,
                    trade.token0_amount,
                    trade.price.map(|p| p.to_string()).unwrap_or_default()
                );
            }
        }
        None => {
            let trades = projection.pair_trades(token0, token1).await?;
            for view in trades.iter().take(limit) {
                println!(
                    "   #{:<5} {:>20} @ {:<12} {}",
                    view.trade.order.id,
                    view.trade.token0_amount,
                    view.trade.price.map(|p| p.to_string()).unwrap_or_default(),
                    view.trend
                );
            }
        }
    }
    Ok(())
}

/// Events of one user, or the whole log
pub async fn events(ctx: &AppContext, user: Option<&str>) -> Result<(), anyhow::Error> {
    let records = match user {
        Some(user) => ctx.projection()?.user_events(&ctx.account(user)).await?,
        None => ctx.runtime.events().records().to_vec(),
    };
    for record in &records {
        println!("{}", serde_json::to_string(record)?);
    }
    Ok(())
}

/// Populate a deployed exchange with a sample market.
///
/// The deployer acts as user1 and the `user2` label as user2: user2
/// receives 10,000 mETH, both deposit 10,000 (GC and mETH), user1 makes
/// four orders, cancels one, user2 fills the other three, then each
/// user places ten open orders on opposite sides.
pub async fn seed(ctx: &mut AppContext, config: &DeployConfig) -> Result<(), anyhow::Error> {
    if !ctx.is_deployed() {
        anyhow::bail!("Exchange not deployed; run `gcdex deploy` first");
    }

    let gc = ctx.token("GC")?.address();
    let meth = ctx.token("mETH")?.address();
    let exchange = ctx.runtime.exchange()?.address();
    let user1 = config.deployer_address();
    let user2 = Address::from_label("user2");
    let amount = TokenAmount::tokens(10_000);
    let tokens = TokenAmount::tokens;

    let mut clock = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
    let mut send = |sender: Address, call: Call| {
        clock += 1;
        (sender, clock, call)
    };

    let mut script = vec![
        send(user1, Call::Transfer { token: meth, to: user2, amount }),
        send(user1, Call::Approve { token: gc, spender: exchange, amount }),
        send(user1, Call::DepositToken { token: gc, amount }),
        send(user2, Call::Approve { token: meth, spender: exchange, amount }),
        send(user2, Call::DepositToken { token: meth, amount }),
    ];
    for (get, give) in [(100, 5), (100, 10), (50, 15), (200, 20)] {
        script.push(send(
            user1,
            Call::MakeOrder {
                token_get: meth,
                amount_get: tokens(get),
                token_give: gc,
                amount_give: tokens(give),
            },
        ));
    }

    let first = ctx.runtime.exchange()?.order_count() + 1;
    script.push(send(user1, Call::CancelOrder { id: first }));
    for id in first + 1..=first + 3 {
        script.push(send(user2, Call::FillOrder { id }));
    }
    for i in 1..=10 {
        script.push(send(
            user1,
            Call::MakeOrder {
                token_get: meth,
                amount_get: tokens(10 * i),
                token_give: gc,
                amount_give: tokens(10),
            },
        ));
    }
    for i in 1..=10 {
        script.push(send(
            user2,
            Call::MakeOrder {
                token_get: gc,
                amount_get: tokens(10),
                token_give: meth,
                amount_give: tokens(10 * i),
            },
        ));
    }

    let total = script.len();
    for (sender, timestamp, call) in script {
        ctx.commit_at(sender, timestamp, call).await?;
    }

    println!("✅ Seeded exchange with {total} transactions");
    println!("   user1: {user1}");
    println!("   user2: {user2}");
    Ok(())
}

fn order_id(receipt: &Receipt) -> Result<OrderId, anyhow::Error> {
    receipt
        .order_id
        .ok_or_else(|| anyhow::anyhow!("Receipt {} carries no order id", receipt.index))
}
