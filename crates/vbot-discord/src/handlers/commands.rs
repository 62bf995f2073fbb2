use serenity::all::{
    ChannelType, CommandInteraction, CommandOptionType, Context, CreateCommand,
    CreateCommandOption, Permissions, ResolvedValue, User,
};

use vbot_core::{
    commands::{self, ArgValue, Args, CommandSpec, OptionKind, OptionSpec},
    dispatch::respond_error,
    domain::{
        ChannelId, ChannelRef, GuildId, GuildRef, Invocation, Invoker, RoleId, RoleRef, UserId,
        UserRef,
    },
    errors::Error,
    messaging::port::InteractionPort,
};

use crate::{router::AppState, DiscordGuilds, DiscordInteraction};

pub fn registrations() -> Vec<CreateCommand> {
    commands::all().iter().map(create_command).collect()
}

fn create_command(spec: &CommandSpec) -> CreateCommand {
    let mut cmd = CreateCommand::new(spec.name).description(spec.description);
    if spec.admin_only {
        cmd = cmd.default_member_permissions(Permissions::ADMINISTRATOR);
    }
    for option in &spec.options {
        cmd = cmd.add_option(create_option(option));
    }
    cmd
}

fn create_option(spec: &OptionSpec) -> CreateCommandOption {
    let kind = match spec.kind {
        OptionKind::String => CommandOptionType::String,
        OptionKind::Integer { .. } => CommandOptionType::Integer,
        OptionKind::Boolean => CommandOptionType::Boolean,
        OptionKind::Role => CommandOptionType::Role,
        OptionKind::Channel => CommandOptionType::Channel,
        OptionKind::User => CommandOptionType::User,
    };

    let option =
        CreateCommandOption::new(kind, spec.name, spec.description).required(spec.required);
    match spec.kind {
        OptionKind::Integer { min, max } => option.min_int_value(min).max_int_value(max),
        OptionKind::Channel => option.channel_types(vec![ChannelType::Text]),
        _ => option,
    }
}

fn user_ref(user: &User) -> UserRef {
    UserRef {
        id: UserId(user.id.get()),
        tag: user.tag(),
        avatar_url: user.avatar_url(),
    }
}

fn arg_value(value: &ResolvedValue<'_>) -> Option<ArgValue> {
    let v = match value {
        ResolvedValue::String(s) => ArgValue::Str((*s).to_string()),
        ResolvedValue::Integer(n) => ArgValue::Int(*n),
        ResolvedValue::Boolean(b) => ArgValue::Bool(*b),
        ResolvedValue::Role(role) => ArgValue::Role(RoleRef {
            id: RoleId(role.id.get()),
            name: role.name.clone(),
        }),
        ResolvedValue::Channel(channel) => ArgValue::Channel(ChannelRef {
            id: ChannelId(channel.id.get()),
            name: channel.name.clone(),
        }),
        ResolvedValue::User(user, _) => ArgValue::User(user_ref(user)),
        _ => return None,
    };
    Some(v)
}

fn collect_args(command: &CommandInteraction) -> Args {
    let mut args = Args::new();
    for option in command.data.options() {
        match arg_value(&option.value) {
            Some(v) => args.insert(option.name, v),
            None => tracing::debug!(option = option.name, "ignoring unsupported option value"),
        }
    }
    args
}

fn invocation(ctx: &Context, command: &CommandInteraction, guild_id: GuildId) -> Invocation {
    let guild = ctx
        .cache
        .guild(serenity::all::GuildId::new(guild_id.0))
        .map(|g| crate::guild_ref(&g))
        .unwrap_or_else(|| GuildRef {
            id: guild_id,
            name: "Unknown".to_string(),
            icon_url: None,
        });

    let is_admin = command
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .is_some_and(|p| p.administrator());

    Invocation {
        guild,
        channel: ChannelRef {
            id: ChannelId(command.channel_id.get()),
            name: command.channel.as_ref().and_then(|c| c.name.clone()),
        },
        invoker: Invoker {
            user: user_ref(&command.user),
            is_admin,
        },
        bot_avatar_url: ctx.cache.current_user().avatar_url(),
    }
}

pub async fn handle_command(state: &AppState, ctx: Context, command: CommandInteraction) {
    let name = command.data.name.clone();
    let args = collect_args(&command);
    let guild_id = command.guild_id.map(|g| GuildId(g.get()));
    let inv = guild_id.map(|g| invocation(&ctx, &command, g));

    let reply = DiscordInteraction::new(ctx.http.clone(), command);
    let Some(inv) = inv else {
        let err = Error::Validation("❌ This command can only be used in a server.".to_string());
        respond_error(&reply, &err).await;
        return;
    };

    let guilds = DiscordGuilds::new(ctx.http.clone(), ctx.cache.clone());
    state
        .dispatcher
        .dispatch(&inv, &name, &args, &guilds, &reply)
        .await;

    if !reply.is_acknowledged() {
        tracing::warn!(command = %name, "interaction left unacknowledged");
    }
}
